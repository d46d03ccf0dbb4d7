//! Kemper effect categories and ready-made callbacks.

use switchlink::color::{BLUE, DARK_GRAY, GREEN, ORANGE, PURPLE, RED, WHITE, YELLOW};
use switchlink::kemper::{effect_state, effect_type, EffectSlot};
use switchlink::{ClientListener, ColorValue, ListenerId};

use crate::effect::{EffectCategories, EffectEnableCallback, CATEGORY_NONE};

pub const CATEGORY_WAH: u8 = 1;
pub const CATEGORY_DISTORTION: u8 = 2;
pub const CATEGORY_COMPRESSOR: u8 = 3;
pub const CATEGORY_NOISE_GATE: u8 = 4;
pub const CATEGORY_SPACE: u8 = 5;
pub const CATEGORY_CHORUS: u8 = 6;
pub const CATEGORY_PHASER_FLANGER: u8 = 7;
pub const CATEGORY_EQUALIZER: u8 = 8;
pub const CATEGORY_BOOSTER: u8 = 9;
pub const CATEGORY_LOOPER: u8 = 10;
pub const CATEGORY_PITCH: u8 = 11;
pub const CATEGORY_DUAL: u8 = 12;
pub const CATEGORY_DELAY: u8 = 13;
pub const CATEGORY_REVERB: u8 = 14;

/// Upper bound (inclusive) of each category's effect type range, in order.
/// Types above the last bound are reverbs.
const TYPE_RANGES: [(i32, u8); 14] = [
    (0, CATEGORY_NONE),
    (14, CATEGORY_WAH),
    (45, CATEGORY_DISTORTION),
    (55, CATEGORY_COMPRESSOR),
    (60, CATEGORY_NOISE_GATE),
    (64, CATEGORY_SPACE),
    (80, CATEGORY_CHORUS),
    (95, CATEGORY_PHASER_FLANGER),
    (110, CATEGORY_EQUALIZER),
    (120, CATEGORY_BOOSTER),
    (125, CATEGORY_LOOPER),
    (135, CATEGORY_PITCH),
    (143, CATEGORY_DUAL),
    (170, CATEGORY_DELAY),
];

/// Effect type grouping of the Profiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct KemperEffectCategories;

impl EffectCategories for KemperEffectCategories {
    fn category(&self, effect_type: i32) -> u8 {
        if effect_type < 0 {
            return CATEGORY_NONE;
        }
        TYPE_RANGES
            .iter()
            .find(|(upper, _)| effect_type <= *upper)
            .map_or(CATEGORY_REVERB, |(_, category)| *category)
    }

    fn color(&self, category: u8) -> ColorValue {
        let color = match category {
            CATEGORY_WAH => ORANGE,
            CATEGORY_DISTORTION | CATEGORY_BOOSTER => RED,
            CATEGORY_COMPRESSOR | CATEGORY_NOISE_GATE | CATEGORY_CHORUS => BLUE,
            CATEGORY_SPACE | CATEGORY_DUAL | CATEGORY_DELAY | CATEGORY_REVERB => GREEN,
            CATEGORY_PHASER_FLANGER | CATEGORY_LOOPER => PURPLE,
            CATEGORY_EQUALIZER => YELLOW,
            CATEGORY_PITCH => WHITE,
            _ => DARK_GRAY,
        };
        ColorValue::Single(color)
    }

    fn name(&self, category: u8) -> &'static str {
        match category {
            CATEGORY_WAH => "Wah Wah",
            CATEGORY_DISTORTION => "Distortion",
            CATEGORY_COMPRESSOR => "Compressor",
            CATEGORY_NOISE_GATE => "Noise Gate",
            CATEGORY_SPACE => "Space",
            CATEGORY_CHORUS => "Chorus",
            CATEGORY_PHASER_FLANGER => "Phaser",
            CATEGORY_EQUALIZER => "Equalizer",
            CATEGORY_BOOSTER => "Boost",
            CATEGORY_LOOPER => "Looper",
            CATEGORY_PITCH => "Transpose",
            CATEGORY_DUAL => "Dual",
            CATEGORY_DELAY => "Delay",
            CATEGORY_REVERB => "Reverb",
            _ => "-",
        }
    }
}

/// On/off callback for one of the device's effect slots.
pub fn effect_enable<U: ClientListener>(
    id: ListenerId,
    slot: EffectSlot,
    product_type: u8,
) -> EffectEnableCallback<KemperEffectCategories, U> {
    EffectEnableCallback::new(
        id,
        effect_state(slot, product_type),
        effect_type(slot, product_type),
        KemperEffectCategories,
    )
}
