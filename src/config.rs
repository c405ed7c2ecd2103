// Default values for configuration
// These serve as fallback values when no settings file overrides them
pub const APP_NAME: &str = "setcard-annotator";
pub const SETTINGS_DIR_NAME: &str = "SetcardAnnotator";
pub const DEFAULT_OUTPUT_SUBDIR: &str = "labels";

// Matched case-sensitively, discovered in this order
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "JPG", "JPEG", "png", "PNG"];
pub const ANNOTATION_EXTENSION: &str = "json";

pub const MAX_LOG_LINES: usize = 1000;
