//! Scene templates.
//!
//! A scene template is a fixed style-instruction string selected by name and
//! prepended to the image-generation prompt. Unknown keys resolve to no
//! prefix.

/// All scene template keys, in display order.
pub const SCENE_KEYS: [&str; 5] = ["cozy-life", "food", "travel", "fashion", "minimal"];

/// Resolve a scene key to its style-instruction string.
#[must_use]
pub fn scene_template(key: &str) -> Option<&'static str> {
    match key {
        "cozy-life" => Some(
            "Style: healing, fresh everyday-life scene with soft natural light, \
             warm tones and a gentle lived-in atmosphere.",
        ),
        "food" => Some(
            "Style: appetizing close-up food photography, bright and clean, \
             shallow depth of field, styled tabletop.",
        ),
        "travel" => Some(
            "Style: airy travel photography, wide composition, natural daylight, \
             a sense of place and wanderlust.",
        ),
        "fashion" => Some(
            "Style: light editorial fashion photography, soft film grain, \
             muted palette, candid pose.",
        ),
        "minimal" => Some(
            "Style: minimalist composition, generous negative space, \
             clean background, one clear subject.",
        ),
        _ => None,
    }
}
