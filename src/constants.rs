//! Application-wide constants
//!
//! File and directory names that make up a BBS config tree and a portable
//! theme, kept in one place so the engine and its tests agree on layout.

/// Layout of the live configuration tree under a config root
pub mod live {
    /// Directory holding the JSON settings
    pub const SETTINGS_DIR: &str = "settings";

    /// Main settings file; its presence is the config root admission check
    pub const SETTINGS_FILE: &str = "bbs.json";

    /// Textures directory, relative to the config root
    pub const TEXTURES_DIR: [&str; 2] = ["assets", "textures"];

    /// Object holding the primary color
    pub const APPEARANCE_KEY: &str = "appearance";

    /// Primary color field inside `appearance`
    pub const PRIMARY_COLOR_KEY: &str = "primary_color";

    /// Object holding the background color
    pub const BACKGROUND_KEY: &str = "background";

    /// Background color field inside `background`
    pub const BACKGROUND_COLOR_KEY: &str = "color";

    /// Indentation used when writing `bbs.json` back
    pub const JSON_INDENT: &[u8] = b"    ";
}

/// Layout of a portable theme
pub mod theme {
    /// Directory under the config root that holds portable themes
    pub const THEME_DIR: &str = "theme";

    /// Config file inside every portable theme
    pub const CONFIG_FILE: &str = "config.txt";

    /// Primary color key in `config.txt`
    pub const PRIMARY_COLOR_KEY: &str = "primary_color";

    /// Background color key in `config.txt`
    pub const BACKGROUND_COLOR_KEY: &str = "background_color";

    /// Archive suffix (matched case-insensitively on discovery)
    pub const ARCHIVE_SUFFIX: &str = ".zip";
}

/// Bitmap assets shared by the live textures folder and portable themes
pub mod assets {
    pub const BACKGROUND: &str = "background.png";
    pub const ICONS: &str = "icons.png";

    /// Every asset the engine moves, in copy order
    pub const ALL: [&str; 2] = [BACKGROUND, ICONS];
}

/// Scratch directory prefixes (a random suffix is appended per operation)
pub mod scratch {
    pub const IMPORT: &str = ".bbs-theme-import-";
    pub const PREVIEW: &str = ".bbs-theme-preview-";
    pub const EXPORT: &str = ".bbs-theme-export-";

    /// Every prefix; entries starting with one of these are hidden from discovery
    pub const ALL: [&str; 3] = [IMPORT, PREVIEW, EXPORT];
}

/// Default install location
pub mod paths {
    /// Minecraft game directory name under the platform data/config dir
    #[cfg(target_os = "macos")]
    pub const GAME_DIR: &str = "minecraft";
    #[cfg(not(target_os = "macos"))]
    pub const GAME_DIR: &str = ".minecraft";

    /// BBS config directory relative to the game directory
    pub const BBS_CONFIG: [&str; 2] = ["config", "bbs"];

    /// Name fragment expected in a config root directory name
    pub const BBS_DIR_HINT: &str = "bbs";
}
