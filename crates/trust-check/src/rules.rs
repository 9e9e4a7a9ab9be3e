/// A single forbidden-literal rule
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub id: &'static str,
    pub pattern: &'static str,
    pub message: &'static str,
}

pub const DEFAULT_RULES: &[Rule] = &[
    Rule {
        id: "hardcoded-status",
        pattern: r#"(?i)\b(status|state|health)\s*[:=]\s*["'](healthy|operational|compliant|connected|synced)["']"#,
        message: "status literal is fabricated; derive it from a real check",
    },
    Rule {
        id: "hand-set-success",
        pattern: r#"\blifecycle\s*[:=]\s*["']success["']"#,
        message: "lifecycle set to success by hand; build responses through the lifecycle helpers",
    },
    Rule {
        id: "constant-score",
        pattern: r"(?i)\b(compliance|health|risk|trust|credit)_?score\s*[:=]\s*\d",
        message: "score is a constant; compute it or report it as unavailable",
    },
    Rule {
        id: "random-metric",
        pattern: r"Math\.random\(\)|rand::random",
        message: "random value in application code; metrics must come from data",
    },
    Rule {
        id: "zero-fallback",
        pattern: r"(?i)\b\w*(balance|revenue|runway|cash|burn)\w*\s*(\?\?|\|\|)\s*0(\.0+)?\b",
        message: "missing financial figure replaced by zero; report it as unknown instead",
    },
    Rule {
        id: "zero-fallback",
        pattern: r"(?i)\b\w*(balance|revenue|runway|cash|burn)\w*\s*\.\s*unwrap_or\(\s*0(\.0+)?\s*\)",
        message: "missing financial figure replaced by zero; report it as unknown instead",
    },
    Rule {
        id: "placeholder-data",
        pattern: r"(?i)\b(mock|fake|dummy|placeholder)_?(data|metrics|snapshot|insights|accounts|transactions)\b",
        message: "placeholder data shipped in application code",
    },
];
