// Heavenly stems, earthly branches and their element / polarity tables

use serde::{Serialize, Serializer};
use std::fmt;

/// The five elements (五行), in their conventional generating order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    Wood,
    Fire,
    Earth,
    Metal,
    Water,
}

/// Yang / yin (阳 / 阴).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    Yang,
    Yin,
}

/// Heavenly stem (天干), cyclic modulo 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stem {
    Jia,
    Yi,
    Bing,
    Ding,
    Wu,
    Ji,
    Geng,
    Xin,
    Ren,
    Gui,
}

/// Earthly branch (地支), cyclic modulo 12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    Zi,
    Chou,
    Yin,
    Mao,
    Chen,
    Si,
    Wu,
    Wei,
    Shen,
    You,
    Xu,
    Hai,
}

impl Element {
    pub const ALL: [Element; 5] = [
        Element::Wood,
        Element::Fire,
        Element::Earth,
        Element::Metal,
        Element::Water,
    ];

    pub fn glyph(&self) -> &'static str {
        match self {
            Element::Wood => "木",
            Element::Fire => "火",
            Element::Earth => "土",
            Element::Metal => "金",
            Element::Water => "水",
        }
    }

    /// Element this one generates (相生): wood feeds fire, fire makes earth, ...
    pub fn generates(&self) -> Element {
        match self {
            Element::Wood => Element::Fire,
            Element::Fire => Element::Earth,
            Element::Earth => Element::Metal,
            Element::Metal => Element::Water,
            Element::Water => Element::Wood,
        }
    }

    /// Element this one controls (相克): wood parts earth, fire melts metal, ...
    pub fn controls(&self) -> Element {
        match self {
            Element::Wood => Element::Earth,
            Element::Fire => Element::Metal,
            Element::Earth => Element::Water,
            Element::Metal => Element::Wood,
            Element::Water => Element::Fire,
        }
    }

    /// Element that generates this one (its resource).
    pub fn generated_by(&self) -> Element {
        self.generates().generates().generates().generates()
    }

    /// Element that controls this one.
    pub fn controlled_by(&self) -> Element {
        self.generates().generates().generates()
    }

    pub(crate) fn slot(&self) -> usize {
        *self as usize
    }
}

impl Polarity {
    pub fn glyph(&self) -> &'static str {
        match self {
            Polarity::Yang => "阳",
            Polarity::Yin => "阴",
        }
    }

    fn of_index(index: usize) -> Polarity {
        if index % 2 == 0 {
            Polarity::Yang
        } else {
            Polarity::Yin
        }
    }
}

const STEM_GLYPHS: [&str; 10] = ["甲", "乙", "丙", "丁", "戊", "己", "庚", "辛", "壬", "癸"];

const BRANCH_GLYPHS: [&str; 12] = [
    "子", "丑", "寅", "卯", "辰", "巳", "午", "未", "申", "酉", "戌", "亥",
];

const BRANCH_ELEMENTS: [Element; 12] = [
    Element::Water, // 子
    Element::Earth, // 丑
    Element::Wood,  // 寅
    Element::Wood,  // 卯
    Element::Earth, // 辰
    Element::Fire,  // 巳
    Element::Fire,  // 午
    Element::Earth, // 未
    Element::Metal, // 申
    Element::Metal, // 酉
    Element::Earth, // 戌
    Element::Water, // 亥
];

impl Stem {
    pub const ALL: [Stem; 10] = [
        Stem::Jia,
        Stem::Yi,
        Stem::Bing,
        Stem::Ding,
        Stem::Wu,
        Stem::Ji,
        Stem::Geng,
        Stem::Xin,
        Stem::Ren,
        Stem::Gui,
    ];

    /// Stem at a cyclic index; any integer is reduced modulo 10.
    pub fn from_index(index: i64) -> Stem {
        Stem::ALL[index.rem_euclid(10) as usize]
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Stems come in element pairs: 甲乙 wood, 丙丁 fire, 戊己 earth, 庚辛 metal, 壬癸 water.
    pub fn element(&self) -> Element {
        Element::ALL[self.index() / 2]
    }

    pub fn polarity(&self) -> Polarity {
        Polarity::of_index(self.index())
    }

    pub fn glyph(&self) -> &'static str {
        STEM_GLYPHS[self.index()]
    }
}

impl Branch {
    pub const ALL: [Branch; 12] = [
        Branch::Zi,
        Branch::Chou,
        Branch::Yin,
        Branch::Mao,
        Branch::Chen,
        Branch::Si,
        Branch::Wu,
        Branch::Wei,
        Branch::Shen,
        Branch::You,
        Branch::Xu,
        Branch::Hai,
    ];

    /// Branch at a cyclic index; any integer is reduced modulo 12.
    pub fn from_index(index: i64) -> Branch {
        Branch::ALL[index.rem_euclid(12) as usize]
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn element(&self) -> Element {
        BRANCH_ELEMENTS[self.index()]
    }

    pub fn polarity(&self) -> Polarity {
        Polarity::of_index(self.index())
    }

    pub fn glyph(&self) -> &'static str {
        BRANCH_GLYPHS[self.index()]
    }
}

macro_rules! glyph_display {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                    f.write_str(self.glyph())
                }
            }

            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.serialize_str(self.glyph())
                }
            }
        )*
    };
}

glyph_display!(Element, Polarity, Stem, Branch);
