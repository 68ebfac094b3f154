// Element and polarity tallies over the eight chart symbols

use crate::bazi::{BaziChart, Pillar};
use crate::symbols::{Element, Polarity};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Symbols in a chart: one stem and one branch per pillar.
pub const SYMBOLS_PER_CHART: u32 = 8;

/// Count of each element across a chart's stems and branches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementTally {
    counts: [u32; 5],
}

impl ElementTally {
    /// Build a tally from explicit counts in 木火土金水 order.
    pub fn from_counts(wood: u32, fire: u32, earth: u32, metal: u32, water: u32) -> Self {
        Self {
            counts: [wood, fire, earth, metal, water],
        }
    }

    pub fn count(&self, element: Element) -> u32 {
        self.counts[element.slot()]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Element, u32)> + '_ {
        Element::ALL.iter().map(move |e| (*e, self.count(*e)))
    }

    /// Elements with the highest count, in 木火土金水 order.
    pub fn dominant(&self) -> Vec<Element> {
        let max = self.counts.iter().copied().max().unwrap_or(0);
        self.iter()
            .filter(|(_, n)| *n == max && max > 0)
            .map(|(e, _)| e)
            .collect()
    }

    /// Elements that do not appear in the chart at all.
    pub fn missing(&self) -> Vec<Element> {
        self.iter().filter(|(_, n)| *n == 0).map(|(e, _)| e).collect()
    }

    /// Share and rating of every element, in 木火土金水 order.
    pub fn balance(&self) -> ElementBalance {
        let total = self.total();
        let shares = Element::ALL.map(|element| {
            let count = self.count(element);
            let percentage = if total == 0 {
                0.0
            } else {
                f64::from(count) * 100.0 / f64::from(total)
            };
            ElementShare {
                element,
                count,
                percentage: (percentage * 10.0).round() / 10.0,
                rating: ElementRating::from_percentage(percentage),
            }
        });
        ElementBalance { shares }
    }

    fn add(&mut self, element: Element) {
        self.counts[element.slot()] += 1;
    }
}

impl Serialize for ElementTally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Element::ALL.len()))?;
        for (element, count) in self.iter() {
            map.serialize_entry(element.glyph(), &count)?;
        }
        map.end()
    }
}

/// 强 at 30% of the chart or more, 中等 from 20%, 弱 below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRating {
    Strong,
    Moderate,
    Weak,
}

impl ElementRating {
    fn from_percentage(percentage: f64) -> ElementRating {
        if percentage >= 30.0 {
            ElementRating::Strong
        } else if percentage >= 20.0 {
            ElementRating::Moderate
        } else {
            ElementRating::Weak
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            ElementRating::Strong => "强",
            ElementRating::Moderate => "中等",
            ElementRating::Weak => "弱",
        }
    }
}

impl Serialize for ElementRating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.glyph())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElementShare {
    #[serde(skip)]
    pub element: Element,
    pub count: u32,
    pub percentage: f64,
    pub rating: ElementRating,
}

/// Per-element shares, serialized as `{"木": {count, percentage, rating}, ...}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementBalance {
    shares: [ElementShare; 5],
}

impl ElementBalance {
    pub fn get(&self, element: Element) -> &ElementShare {
        &self.shares[element.slot()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementShare> {
        self.shares.iter()
    }
}

impl Serialize for ElementBalance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.shares.len()))?;
        for share in &self.shares {
            map.serialize_entry(share.element.glyph(), share)?;
        }
        map.end()
    }
}

/// Yang / yin counts across a chart's stems and branches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolarityTally {
    pub yang: u32,
    pub yin: u32,
}

impl Serialize for PolarityTally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(Polarity::Yang.glyph(), &self.yang)?;
        map.serialize_entry(Polarity::Yin.glyph(), &self.yin)?;
        map.end()
    }
}

pub fn tally(chart: &BaziChart) -> ElementTally {
    tally_pillars(&chart.pillars())
}

/// Tally over any subset of pillars, e.g. the three date pillars when the hour is unknown.
pub fn tally_pillars(pillars: &[Pillar]) -> ElementTally {
    let mut tally = ElementTally::default();
    for pillar in pillars {
        tally.add(pillar.stem.element());
        tally.add(pillar.branch.element());
    }
    tally
}

pub fn polarity_tally(chart: &BaziChart) -> PolarityTally {
    let mut tally = PolarityTally::default();
    let polarities = chart
        .pillars()
        .into_iter()
        .flat_map(|p| [p.stem.polarity(), p.branch.polarity()]);
    for polarity in polarities {
        match polarity {
            Polarity::Yang => tally.yang += 1,
            Polarity::Yin => tally.yin += 1,
        }
    }
    tally
}
