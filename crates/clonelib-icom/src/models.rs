//! Clone-mode descriptors for Icom radios.
//!
//! Each function returns the transport-level facts the clone session needs
//! for one model. Nothing here describes what the image bytes mean; that is
//! left to whatever consumes the [`MemoryMap`](clonelib_core::MemoryMap).
//!
//! | Model       | Model id      | Image     | Hi-speed | Payload | Notes           |
//! |-------------|---------------|-----------|----------|---------|-----------------|
//! | IC-2100H    | `20 88 00 01` | 2016      | no       | hex     |                 |
//! | IC-2200H    | `26 98 00 01` | 6848      | yes      | hex     |                 |
//! | IC-V82/U82  | `28 26 00 01` | 6464      | no       | hex     | double identify |
//! | IC-2820H    | `29 70 00 01` | 44224     | yes      | hex     |                 |
//! | IC-2730A    | `35 98 00 01` | 21312     | yes      | hex     |                 |
//! | ID-31A      | `33 22 00 01` | `0x15500` | yes      | hex     | 4-byte address  |
//! | ID-4100A    | `38 66 00 01` | `0x2A3C0` | yes      | raw     | high bit flip   |

use clonelib_core::{CloneRange, RadioDescriptor};

/// Every model in this module.
pub fn all_models() -> Vec<RadioDescriptor> {
    vec![
        ic_2100h(),
        ic_2200h(),
        ic_v82(),
        ic_2820h(),
        ic_2730a(),
        id_31a(),
        id_4100a(),
    ]
}

/// Look a model up by name, ignoring case.
pub fn by_name(name: &str) -> Option<RadioDescriptor> {
    all_models()
        .into_iter()
        .find(|m| m.name.eq_ignore_ascii_case(name))
}

/// Icom IC-2100H mobile.
pub fn ic_2100h() -> RadioDescriptor {
    RadioDescriptor::new(
        "IC-2100H",
        [0x20, 0x88, 0x00, 0x01],
        2016,
        b"Icom Inc.",
        vec![CloneRange::new(0x0000, 0x07E0, 32)],
    )
}

/// Icom IC-2200H mobile.
pub fn ic_2200h() -> RadioDescriptor {
    RadioDescriptor::new(
        "IC-2200H",
        [0x26, 0x98, 0x00, 0x01],
        6848,
        b"Icom Inc.D8",
        vec![
            CloneRange::new(0x0000, 0x1340, 32),
            CloneRange::new(0x1340, 0x1360, 16),
            CloneRange::new(0x1360, 0x136B, 8),
            CloneRange::new(0x1370, 0x1380, 16),
            CloneRange::new(0x1380, 0x15E0, 32),
            CloneRange::new(0x15E0, 0x1600, 16),
            CloneRange::new(0x1600, 0x1640, 32),
            CloneRange::new(0x1640, 0x1660, 16),
            CloneRange::new(0x1660, 0x1680, 32),
            CloneRange::new(0x16E0, 0x1860, 32),
            CloneRange::new(0x1880, 0x1AB0, 32),
            CloneRange::new(0x1AB8, 0x1AC0, 8),
        ],
    )
    .with_hispeed()
}

/// Icom IC-V82 / IC-U82 handhelds. Both must be identified twice before
/// they accept a clone.
pub fn ic_v82() -> RadioDescriptor {
    RadioDescriptor::new(
        "IC-V82/U82",
        [0x28, 0x26, 0x00, 0x01],
        6464,
        b"Icom Inc.CD",
        vec![
            CloneRange::new(0x0000, 0x1340, 32),
            CloneRange::new(0x1340, 0x1360, 16),
            CloneRange::new(0x1360, 0x136B, 8),
            CloneRange::new(0x1370, 0x1440, 32),
            CloneRange::new(0x1460, 0x15D0, 32),
            CloneRange::new(0x15E0, 0x1930, 32),
            CloneRange::new(0x1938, 0x1940, 8),
        ],
    )
    .with_double_ident()
}

/// Icom IC-2820H D-STAR mobile.
pub fn ic_2820h() -> RadioDescriptor {
    RadioDescriptor::new(
        "IC-2820H",
        [0x29, 0x70, 0x00, 0x01],
        44224,
        b"Icom Inc.68",
        vec![
            CloneRange::new(0x0000, 0x6960, 32),
            CloneRange::new(0x6960, 0x6980, 16),
            CloneRange::new(0x6980, 0x7160, 32),
            CloneRange::new(0x7160, 0x7180, 16),
            CloneRange::new(0x7180, 0xACC0, 32),
        ],
    )
    .with_hispeed()
}

/// Icom IC-2730A dual-band mobile.
pub fn ic_2730a() -> RadioDescriptor {
    RadioDescriptor::new(
        "IC-2730A",
        [0x35, 0x98, 0x00, 0x01],
        21312,
        b"Icom Inc.4E",
        vec![
            CloneRange::new(0x0000, 0x5300, 64),
            CloneRange::new(0x5300, 0x5310, 16),
            CloneRange::new(0x5310, 0x5340, 48),
        ],
    )
    .with_hispeed()
}

/// Icom ID-31A D-STAR handheld.
pub fn id_31a() -> RadioDescriptor {
    RadioDescriptor::new(
        "ID-31A",
        [0x33, 0x22, 0x00, 0x01],
        0x15500,
        b"Icom Inc.A8",
        vec![CloneRange::new(0x00000, 0x15500, 32)],
    )
    .with_hispeed()
}

/// Icom ID-4100A D-STAR mobile.
pub fn id_4100a() -> RadioDescriptor {
    RadioDescriptor::new(
        "ID-4100A",
        [0x38, 0x66, 0x00, 0x01],
        0x2A3C0,
        b"Icom Inc.8F",
        vec![CloneRange::new(0, 0x2A3C0, 64)],
    )
    .with_hispeed()
    .with_raw_frames()
    .with_highbit_flip()
    .with_map_revision(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_models_validate() {
        for model in all_models() {
            model
                .validate()
                .unwrap_or_else(|e| panic!("{} failed validation: {e}", model.name));
        }
    }

    #[test]
    fn model_ids_are_unique() {
        let models = all_models();
        for (i, a) in models.iter().enumerate() {
            for b in &models[i + 1..] {
                assert_ne!(a.model, b.model, "{} and {}", a.name, b.name);
            }
        }
    }

    #[test]
    fn ranges_are_ordered_and_disjoint() {
        for model in all_models() {
            for pair in model.ranges.windows(2) {
                assert!(pair[0].end <= pair[1].start, "{}", model.name);
            }
        }
    }

    #[test]
    fn wide_addresses_only_for_large_images() {
        assert!(!ic_2820h().is_wide_address());
        assert!(id_31a().is_wide_address());
        assert!(id_4100a().is_wide_address());
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(by_name("ic-2820h").map(|m| m.memsize), Some(44224));
        assert!(by_name("IC-7300").is_none());
    }

    #[test]
    fn only_id_4100a_uses_raw_frames() {
        let raw: Vec<&str> = all_models()
            .iter()
            .filter(|m| m.uses_raw_frames())
            .map(|m| m.name)
            .collect();
        assert_eq!(raw, vec!["ID-4100A"]);
    }

    #[test]
    fn feature_flags() {
        assert!(!ic_2100h().is_hispeed());
        assert!(!ic_2730a().uses_raw_frames());
        assert!(ic_v82().double_ident);
        let id4100 = id_4100a();
        assert!(id4100.highbit_flip);
        assert_eq!(id4100.map_revision, Some(1));
    }
}
