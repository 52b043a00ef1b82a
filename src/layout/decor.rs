use super::types::Decoration;

const SCALE_STEPS: [f32; 3] = [1.25, 1.35, 1.45];

/// 32-bit string hash (`h * 31 + c` with wrap-around) over UTF-16 code units.
pub fn id_hash(id: &str) -> i32 {
    id.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

/// Backdrop rotation and scale for a person card, stable across runs.
pub fn decoration_for(id: &str) -> Decoration {
    let hash = id_hash(id).unsigned_abs();
    let rotation_deg = if hash % 2 == 0 { 0.0 } else { 180.0 };
    let scale = SCALE_STEPS[(hash % SCALE_STEPS.len() as u32) as usize];
    Decoration {
        rotation_deg,
        scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_matches_known_values() {
        assert_eq!(id_hash(""), 0);
        assert_eq!(id_hash("a"), 97);
        assert_eq!(id_hash("ab"), 97 * 31 + 98);
    }

    #[test]
    fn decoration_is_a_pure_function_of_the_id() {
        let first = decoration_for("person-42");
        let second = decoration_for("person-42");
        assert_eq!(first, second);
        assert!(SCALE_STEPS.contains(&first.scale));
        assert!(first.rotation_deg == 0.0 || first.rotation_deg == 180.0);
    }

    #[test]
    fn long_ids_wrap_without_panicking() {
        let id = "x".repeat(10_000);
        let _ = decoration_for(&id);
    }
}
