//! Default setting values, schema version and deprecated keys.
//!
//! The tables here are part of the stored-data compatibility surface: the
//! raw text of each default is written verbatim so existing stores and new
//! ones agree byte for byte.

/// Well-known setting keys.
pub mod key {
    pub const VERSION: &str = "version";
    pub const ENABLED: &str = "enabled";
    pub const IDLE_TIME: &str = "idleTime";
    pub const TRANSITION_TIME: &str = "transitionTime";
    pub const KEEP_AWAKE: &str = "keepAwake";
    pub const CHROME_FULLSCREEN: &str = "chromeFullscreen";
    pub const ALL_DISPLAYS: &str = "allDisplays";
    pub const ACTIVE_START: &str = "activeStart";
    pub const ACTIVE_STOP: &str = "activeStop";
    pub const ALLOW_SUSPEND: &str = "allowSuspend";
    pub const USE_GOOGLE: &str = "useGoogle";
    pub const ALBUM_SELECTIONS: &str = "albumSelections";
    pub const OS: &str = "os";
}

/// Schema version written by [`super::Settings::initialize`].
pub const CURRENT_VERSION: i64 = 9;

/// Stores older than this hold `idleTime`/`transitionTime` as bare numbers.
pub const SLIDER_MIGRATION_VERSION: i64 = 8;

/// Settings that changed from a bare number to a `{base, display, unit}` record.
pub const SLIDER_KEYS: &[&str] = &[key::TRANSITION_TIME, key::IDLE_TIME];

/// Default raw values, in the order they are written.
pub const DEFAULTS: &[(&str, &str)] = &[
    ("enabled", "true"),
    // minutes
    ("idleTime", r#"{"base": 5, "display": 5, "unit": 0}"#),
    // seconds
    ("transitionTime", r#"{"base": 30, "display": 30, "unit": 0}"#),
    ("skip", "true"),
    ("shuffle", "true"),
    ("photoSizing", "0"),
    ("photoTransition", "4"),
    // 12 hr format
    ("showTime", "1"),
    ("showPhotog", "true"),
    (
        "background",
        r#""background:linear-gradient(to bottom, #3a3a3a, #b5bdc8)""#,
    ),
    ("keepAwake", "false"),
    ("chromeFullscreen", "true"),
    ("allDisplays", "false"),
    // 24 hr time
    ("activeStart", r#""00:00""#),
    ("activeStop", r#""00:00""#),
    ("allowSuspend", "false"),
    ("useSpaceReddit", "false"),
    ("useEarthReddit", "false"),
    ("useAnimalReddit", "false"),
    ("useEditors500px", "false"),
    ("usePopular500px", "false"),
    ("useYesterday500px", "false"),
    ("useInterestingFlickr", "false"),
    ("useChromecast", "true"),
    ("useAuthors", "false"),
    ("useGoogle", "true"),
    ("albumSelections", "[]"),
];

/// Keys a restore-to-defaults never touches: the linked account, its album
/// selections and the detected OS.
pub const RESTORE_EXCLUSIONS: &[&str] = &[key::USE_GOOGLE, key::ALBUM_SELECTIONS, key::OS];

/// Keys from older schemas, removed on every initialization.
pub const DEPRECATED_KEYS: &[&str] = &[
    "isPreview",
    "windowID",
    "useFavoriteFlickr",
    "useFlickr",
    "useFlickrSelections",
    "use500px",
    "use500pxSelections",
    "useReddit",
    "useRedditSelections",
];

/// Default raw value for `key`, if it has one.
pub fn default_for(key: &str) -> Option<&'static str> {
    DEFAULTS.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}
