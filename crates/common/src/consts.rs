pub const CONFIG_PATH_ENV: &str = "CALLPULSE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "./callpulse.yaml";
pub const REPORT_FORMAT_ENV: &str = "CALLPULSE_REPORT";
pub const AGENT_LINE_PREFIX: &str = "agent:";

// per-text label thresholds
pub const POSITIVE_THRESHOLD: f64 = 0.05;
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

pub const DEFAULT_NEUTRAL_BAND: f64 = 0.1;
pub const DEFAULT_ESCALATION_THRESHOLD: usize = 3;
pub const DEFAULT_STRONG_NEGATIVE_THRESHOLD: f64 = -0.5;
pub const DEFAULT_TREND_WINDOW: usize = 3;
pub const DEFAULT_TOP_NEGATIVE: usize = 3;
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 2000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_NEUTRAL_PHRASES: &[&str] = &[
    "not bad",
    "ok",
    "okay",
    "its ok",
    "it's ok",
    "its fine",
    "it's fine",
    "fine",
    "average",
    "not negative",
];

pub const DEFAULT_URGENCY_KEYWORDS: &[&str] = &[
    "urgent",
    "urgently",
    "asap",
    "immediately",
    "now",
    "right now",
    "soon",
    "please help",
    "help me",
    "emergency",
];

pub const BILLING_KEYWORDS: &[&str] = &[
    "bill",
    "billing",
    "billed",
    "charge",
    "charged",
    "charges",
    "invoice",
    "payment",
    "overcharged",
];

pub const REFUND_KEYWORDS: &[&str] = &[
    "refund",
    "refunds",
    "return",
    "money back",
    "replace",
    "replacement",
    "exchange",
];

pub const DELIVERY_KEYWORDS: &[&str] = &[
    "delivery",
    "delivered",
    "shipping",
    "shipment",
    "courier",
    "package",
    "track",
    "tracking",
    "late",
];

pub const TECHNICAL_KEYWORDS: &[&str] = &[
    "broken",
    "not working",
    "error",
    "bug",
    "crash",
    "crashes",
    "slow",
    "issue",
    "glitch",
];

pub const ACCOUNT_KEYWORDS: &[&str] = &[
    "login",
    "log in",
    "password",
    "account",
    "account locked",
    "profile",
    "signup",
    "sign up",
];
