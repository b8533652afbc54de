#![allow(clippy::float_cmp)]

use std::collections::HashMap;

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn from_lookup_defaults() {
    let cfg = EngineConfig::from_lookup(|_| None).unwrap();
    assert_eq!(cfg, EngineConfig::default());
    assert_eq!(cfg.history_cap, Some(50));
    assert_eq!(cfg.marquee_policy, MarqueePolicy::Intersect);
    assert!(!cfg.snap_to_grid);
    assert_eq!(cfg.grid_size, 20.0);
    assert_eq!(cfg.min_size, 10.0);
    assert_eq!(cfg.paste_offset, 20.0);
}

#[test]
fn from_lookup_parses_overrides() {
    let cfg = EngineConfig::from_lookup(lookup_from(&[
        ("CANVAS_HISTORY_CAP", "7"),
        ("CANVAS_MARQUEE_POLICY", "contain"),
        ("CANVAS_SNAP_TO_GRID", "true"),
        ("CANVAS_GRID_SIZE", "25"),
        ("CANVAS_MIN_SIZE", "5"),
        ("CANVAS_PASTE_OFFSET", "-8"),
    ]))
    .unwrap();
    assert_eq!(cfg.history_cap, Some(7));
    assert_eq!(cfg.marquee_policy, MarqueePolicy::Contain);
    assert!(cfg.snap_to_grid);
    assert_eq!(cfg.grid_size, 25.0);
    assert_eq!(cfg.min_size, 5.0);
    assert_eq!(cfg.paste_offset, -8.0);
}

#[test]
fn history_cap_unbounded_spellings() {
    for raw in ["0", "unbounded", " Unbounded "] {
        let cfg = EngineConfig::from_lookup(lookup_from(&[("CANVAS_HISTORY_CAP", raw)])).unwrap();
        assert_eq!(cfg.history_cap, None, "{raw}");
    }
}

#[test]
fn unparsable_numbers_fall_back() {
    let cfg = EngineConfig::from_lookup(lookup_from(&[
        ("CANVAS_HISTORY_CAP", "lots"),
        ("CANVAS_GRID_SIZE", "-4"),
        ("CANVAS_MIN_SIZE", "NaN"),
        ("CANVAS_PASTE_OFFSET", "far"),
        ("CANVAS_SNAP_TO_GRID", "maybe"),
    ]))
    .unwrap();
    assert_eq!(cfg, EngineConfig::default());
}

#[test]
fn snap_flag_spellings() {
    for (raw, expected) in [("1", true), ("on", true), ("YES", true), ("0", false), ("off", false)] {
        let cfg = EngineConfig::from_lookup(lookup_from(&[("CANVAS_SNAP_TO_GRID", raw)])).unwrap();
        assert_eq!(cfg.snap_to_grid, expected, "{raw}");
    }
}

#[test]
fn unknown_policy_is_error() {
    let err = EngineConfig::from_lookup(lookup_from(&[("CANVAS_MARQUEE_POLICY", "lasso")])).unwrap_err();
    assert_eq!(err, ConfigError::UnknownMarqueePolicy("lasso".into()));
    assert_eq!(err.error_code(), "E_CONFIG_MARQUEE_POLICY");
    assert!(err.to_string().contains("lasso"));
}
