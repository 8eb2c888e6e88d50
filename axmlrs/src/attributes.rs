//! Attribute post-processing: the static framework attribute-id table used
//! when obfuscated manifests blank out attribute names, and the value
//! humanisation tables for well-known enum and bitmask attributes.

/// Names for framework `attr` resource ids (`0x0101xxxx`). The APK's own
/// resource table never defines these, so the lookup is a fixed dictionary.
pub fn framework_attribute_name(res_id: u32) -> Option<&'static str> {
    let name = match res_id {
        0x0101_0000 => "theme",
        0x0101_0001 => "label",
        0x0101_0002 => "icon",
        0x0101_0003 => "name",
        0x0101_0004 => "manageSpaceActivity",
        0x0101_0005 => "allowClearUserData",
        0x0101_0006 => "permission",
        0x0101_0007 => "readPermission",
        0x0101_0008 => "writePermission",
        0x0101_0009 => "protectionLevel",
        0x0101_000a => "permissionGroup",
        0x0101_000b => "sharedUserId",
        0x0101_000c => "hasCode",
        0x0101_000d => "persistent",
        0x0101_000e => "enabled",
        0x0101_000f => "debuggable",
        0x0101_0010 => "exported",
        0x0101_0011 => "process",
        0x0101_0012 => "taskAffinity",
        0x0101_0013 => "multiprocess",
        0x0101_0014 => "finishOnTaskLaunch",
        0x0101_0015 => "clearTaskOnLaunch",
        0x0101_0016 => "stateNotNeeded",
        0x0101_0017 => "excludeFromRecents",
        0x0101_0018 => "authorities",
        0x0101_0019 => "syncable",
        0x0101_001a => "initOrder",
        0x0101_001b => "grantUriPermissions",
        0x0101_001c => "priority",
        0x0101_001d => "launchMode",
        0x0101_001e => "screenOrientation",
        0x0101_001f => "configChanges",
        0x0101_0020 => "description",
        0x0101_0021 => "targetPackage",
        0x0101_0022 => "handleProfiling",
        0x0101_0023 => "functionalTest",
        0x0101_0024 => "value",
        0x0101_0025 => "resource",
        0x0101_0026 => "mimeType",
        0x0101_0027 => "scheme",
        0x0101_0028 => "host",
        0x0101_0029 => "port",
        0x0101_002a => "path",
        0x0101_002b => "pathPrefix",
        0x0101_002c => "pathPattern",
        0x0101_020c => "minSdkVersion",
        0x0101_021b => "versionCode",
        0x0101_021c => "versionName",
        0x0101_022b => "windowSoftInputMode",
        0x0101_0270 => "targetSdkVersion",
        0x0101_0271 => "maxSdkVersion",
        0x0101_0280 => "allowBackup",
        0x0101_02b7 => "installLocation",
        0x0101_03af => "supportsRtl",
        0x0101_04ec => "usesCleartextTraffic",
        0x0101_052c => "roundIcon",
        0x0101_0572 => "compileSdkVersion",
        0x0101_0573 => "compileSdkVersionCodename",
        0x0101_057a => "appComponentFactory",
        _ => return None,
    };
    Some(name)
}

/// Rewrites the values of well-known enum/bitmask attributes into their
/// textual form. Returns `None` when the attribute has no mapping or the
/// value is not numeric, leaving the value untouched.
pub fn humanize(attr_name: &str, value: &str) -> Option<String> {
    let v = parse_int(value)?;
    match attr_name {
        "screenOrientation" => screen_orientation(v),
        "configChanges" => config_changes(v as u32),
        "windowSoftInputMode" => window_soft_input_mode(v as u32),
        "launchMode" => pick(v, &["standard", "singleTop", "singleTask", "singleInstance"]),
        "documentLaunchMode" => pick(v, &["intoExisting", "always", "none", "never"]),
        "installLocation" => pick(v, &["auto", "internalOnly", "preferExternal"]),
        "protectionLevel" => protection_level(v as u32),
        _ => None,
    }
}

/// Accepts decimal or `0x`-prefixed hex; anything else is a no-op.
fn parse_int(value: &str) -> Option<i64> {
    if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else {
        value.parse::<i64>().ok()
    }
}

fn pick(v: i64, names: &[&str]) -> Option<String> {
    usize::try_from(v)
        .ok()
        .and_then(|i| names.get(i))
        .map(|s| (*s).to_owned())
}

fn screen_orientation(v: i64) -> Option<String> {
    if v == -1 {
        return Some("unspecified".to_owned());
    }
    pick(
        v,
        &[
            "landscape",
            "portrait",
            "user",
            "behind",
            "sensor",
            "nosensor",
            "sensorLandscape",
            "sensorPortrait",
            "reverseLandscape",
            "reversePortrait",
            "fullSensor",
            "userLandscape",
            "userPortrait",
            "fullUser",
            "locked",
        ],
    )
}

// Bit dictionary of the upstream humanisation tables. The names sit two bit
// positions above the platform's own constants (keyboardHidden at bit 7,
// screenLayout at bit 10); fontScale is the lone high flag and always comes
// last in the rendered list.
const CONFIG_CHANGES: &[(u32, &str)] = &[
    (2, "mcc"),
    (3, "mnc"),
    (4, "locale"),
    (5, "touchscreen"),
    (6, "keyboard"),
    (7, "keyboardHidden"),
    (8, "navigation"),
    (9, "orientation"),
    (10, "screenLayout"),
    (11, "uiMode"),
    (12, "screenSize"),
    (13, "smallestScreenSize"),
    (14, "density"),
    (15, "layoutDirection"),
];

const FONT_SCALE_BIT: u32 = 30;

fn config_changes(v: u32) -> Option<String> {
    let mut parts: Vec<&str> = CONFIG_CHANGES
        .iter()
        .filter(|(bit, _)| v & (1 << bit) != 0)
        .map(|(_, name)| *name)
        .collect();
    if v & (1 << FONT_SCALE_BIT) != 0 {
        parts.push("fontScale");
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("|"))
    }
}

// Index-based encoding: the state nibble indexes the state list directly
// (the older flag-valued encoding is not supported here).
fn window_soft_input_mode(v: u32) -> Option<String> {
    const STATES: [&str; 6] = [
        "stateUnspecified",
        "stateUnchanged",
        "stateHidden",
        "stateAlwaysHidden",
        "stateVisible",
        "stateAlwaysVisible",
    ];
    const ADJUSTS: [&str; 4] = [
        "adjustUnspecified",
        "adjustResize",
        "adjustPan",
        "adjustNothing",
    ];

    let mut parts = Vec::new();
    if let Some(state) = STATES.get((v & 0x0f) as usize) {
        if *state != "stateUnspecified" {
            parts.push(*state);
        }
    }
    if let Some(adjust) = ADJUSTS.get(((v >> 4) & 0x0f) as usize) {
        if *adjust != "adjustUnspecified" {
            parts.push(*adjust);
        }
    }
    if parts.is_empty() {
        Some("stateUnspecified".to_owned())
    } else {
        Some(parts.join("|"))
    }
}

// Low nibble is the base level, 0x10 and 0x20 are additive flags.
fn protection_level(v: u32) -> Option<String> {
    let base = match v & 0x0f {
        0 => "normal",
        1 => "dangerous",
        2 => "signature",
        3 => "signatureOrSystem",
        _ => return None,
    };
    let mut out = base.to_owned();
    if v & 0x10 != 0 {
        out.push_str("|system");
    }
    if v & 0x20 != 0 {
        out.push_str("|development");
    }
    Some(out)
}
