// Daily fortune, wealth index and advice derived from an element tally

use crate::bazi::{self, BaziChart};
use crate::elements::{self, ElementBalance, ElementTally, PolarityTally};
use crate::error::Result;
use crate::lunar::LunarDate;
use crate::symbols::{Element, Stem};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

const BASE_SCORE: f64 = 50.0;
const MEAN_PER_ELEMENT: f64 = 1.6;
const ADVICE_THRESHOLD: u32 = 4;

/// Support weights for the day master, stems then branches, year to hour.
const STEM_SUPPORT: [u32; 4] = [15, 20, 30, 15];
const BRANCH_SUPPORT: [u32; 4] = [10, 15, 20, 10];
const STRENGTH_CAP: u32 = 100;

pub const BALANCED_ADVICE: &str = "五行平衡，顺势而为";

/// Advice keyed to an overly strong element, in evaluation order.
const STRONG_ELEMENT_ADVICE: [(Element, &str); 4] = [
    (Element::Fire, "火元素偏强，建议保持冷静"),
    (Element::Water, "水元素偏强，适合灵活变通"),
    (Element::Metal, "金元素偏强，有利于财富积累"),
    (Element::Wood, "木元素偏强，适合创新发展"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// `"male"` selects [`Gender::Male`]; every other value falls in the other category.
    pub fn parse(value: &str) -> Gender {
        if value == "male" {
            Gender::Male
        } else {
            Gender::Female
        }
    }
}

fn clamp_score(score: f64) -> u8 {
    score.clamp(0.0, 100.0) as u8
}

/// 100 for a perfectly even spread, decreasing with distance from 1.6 per element.
pub fn balance_score(tally: &ElementTally) -> f64 {
    let deviation: f64 = tally
        .iter()
        .map(|(_, n)| (f64::from(n) - MEAN_PER_ELEMENT).abs())
        .sum();
    100.0 - deviation * 8.0
}

/// Today's fortune score in [0, 100].
pub fn daily_fortune(tally: &ElementTally, gender: Gender, today: NaiveDate) -> u8 {
    let mut score = BASE_SCORE;
    score += (balance_score(tally) - 50.0) * 0.2;

    let date_factor = (today.month() * 3 + today.day()) % 10;
    score += (f64::from(date_factor) - 5.0) * 2.0;

    let fire = f64::from(tally.count(Element::Fire));
    let water = f64::from(tally.count(Element::Water));
    score += match gender {
        Gender::Male => (fire - water) * 2.0,
        Gender::Female => (water - fire) * 2.0,
    };

    clamp_score(score)
}

/// Wealth index in [0, 100]; metal and earth help, water drains.
pub fn wealth_index(tally: &ElementTally, year_stem: Stem) -> u8 {
    let mut score = BASE_SCORE;
    score += f64::from(tally.count(Element::Metal)) * 6.0;
    score += f64::from(tally.count(Element::Earth)) * 4.0;
    score -= f64::from(tally.count(Element::Water)) * 2.0;

    if year_stem.element() == Element::Metal {
        score += 8.0;
    }

    clamp_score(score)
}

pub fn advice(tally: &ElementTally) -> Vec<&'static str> {
    let strong: Vec<&'static str> = STRONG_ELEMENT_ADVICE
        .iter()
        .filter(|(element, _)| tally.count(*element) > ADVICE_THRESHOLD)
        .map(|(_, text)| *text)
        .collect();

    if strong.is_empty() {
        vec![BALANCED_ADVICE]
    } else {
        strong
    }
}

/// Reading of the day stem (日主), the chart's "self" element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayMaster {
    pub stem: Stem,
    pub element: Element,
    /// 0-100; 50 base plus weighted support from same-element symbols.
    pub strength: u8,
    /// Element that generates the day master (印).
    pub supported_by: Element,
    /// Element the day master generates (食伤).
    pub feeds: Element,
    /// Element the day master controls (财).
    pub controls: Element,
    /// Element that controls the day master (官杀).
    pub controlled_by: Element,
    pub character: &'static str,
    pub career: &'static str,
    pub health: &'static str,
}

impl DayMaster {
    pub fn of(chart: &BaziChart) -> DayMaster {
        let stem = chart.day.stem;
        let element = stem.element();
        let (character, career, health) = match element {
            Element::Wood => (
                "性格直爽，善于领导，具有开创精神，但有时过于固执。",
                "适合文艺、教育、医药等行业，也可考虑管理类工作。",
                "注意肝胆健康，避免过度疲劳，多做户外运动。",
            ),
            Element::Fire => (
                "热情奔放，聪慧机灵，具有感染力，但易于冲动。",
                "适合能源、通信、文化、传媒等行业。",
                "注意心脏与血液循环，避免过度兴奋，充分休息。",
            ),
            Element::Earth => (
                "稳重踏实，诚实可信，具有包容心，行动偏慢但基础扎实。",
                "适合房地产、建筑、农业等行业，也适合稳定的公职。",
                "注意脾胃消化，饮食规律，少食油腻。",
            ),
            Element::Metal => (
                "性格坚强，意志力强，具有正义感，有时过于严肃。",
                "适合机械、汽车、金融等行业。",
                "注意肺部与呼吸道，秋季需加强锻炼。",
            ),
            Element::Water => (
                "聪慧灵动，机变善谋，适应力强，有时优柔寡断。",
                "适合航运、贸易、旅游、信息产业等流动性工作。",
                "注意肾脏功能，冬季防寒保暖。",
            ),
        };

        DayMaster {
            stem,
            element,
            strength: day_master_strength(chart),
            supported_by: element.generated_by(),
            feeds: element.generates(),
            controls: element.controls(),
            controlled_by: element.controlled_by(),
            character,
            career,
            health,
        }
    }
}

/// How strongly the chart backs its day stem. The day stem always counts itself.
pub fn day_master_strength(chart: &BaziChart) -> u8 {
    let element = chart.day.stem.element();
    let pillars = chart.pillars();

    let support: u32 = pillars
        .iter()
        .zip(STEM_SUPPORT)
        .filter(|(p, _)| p.stem.element() == element)
        .map(|(_, w)| w)
        .chain(
            pillars
                .iter()
                .zip(BRANCH_SUPPORT)
                .filter(|(p, _)| p.branch.element() == element)
                .map(|(_, w)| w),
        )
        .sum();

    (50 + support).min(STRENGTH_CAP) as u8
}

/// Everything computed for one birth moment on one day.
#[derive(Debug, Clone, Serialize)]
pub struct FortuneReport {
    pub lunar: LunarDate,
    pub bazi: BaziChart,
    pub elements: ElementTally,
    pub balance: ElementBalance,
    pub polarity: PolarityTally,
    pub fortune: u8,
    pub wealth: u8,
    pub advice: Vec<&'static str>,
    pub day_master: DayMaster,
}

impl FortuneReport {
    pub fn compute(birth_date: NaiveDate, hour: u32, gender: Gender, today: NaiveDate) -> Result<Self> {
        let (lunar, chart) = bazi::chart_for_solar(birth_date, hour)?;
        let tally = elements::tally(&chart);

        Ok(FortuneReport {
            lunar,
            bazi: chart,
            elements: tally,
            balance: tally.balance(),
            polarity: elements::polarity_tally(&chart),
            fortune: daily_fortune(&tally, gender, today),
            wealth: wealth_index(&tally, chart.year.stem),
            advice: advice(&tally),
            day_master: DayMaster::of(&chart),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bazi::Pillar;
    use crate::symbols::Branch;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Every tally with all eight symbols on a single element.
    fn single_element_tallies() -> Vec<ElementTally> {
        (0..5)
            .map(|i| {
                let mut c = [0u32; 5];
                c[i] = 8;
                ElementTally::from_counts(c[0], c[1], c[2], c[3], c[4])
            })
            .collect()
    }

    #[test]
    fn test_golden_scores() {
        let tally = ElementTally::from_counts(2, 1, 3, 0, 2);
        let today = ymd(2026, 10, 17);

        assert_eq!(daily_fortune(&tally, Gender::Male, today), 54);
        assert_eq!(daily_fortune(&tally, Gender::Female, today), 58);
        assert_eq!(wealth_index(&tally, Stem::Jia), 58);
        assert_eq!(wealth_index(&tally, Stem::Xin), 66);
    }

    #[test]
    fn test_balance_score_extremes() {
        let even = ElementTally::from_counts(2, 2, 2, 1, 1);
        assert!((balance_score(&even) - 80.8).abs() < 1e-9);

        for tally in single_element_tallies() {
            assert!((balance_score(&tally) + 2.4).abs() < 1e-9);
        }
    }

    #[test]
    fn test_scores_stay_in_range() {
        let stems = [Stem::Jia, Stem::Geng, Stem::Xin, Stem::Gui];
        let mut day = ymd(2026, 1, 1);
        for tally in single_element_tallies() {
            for gender in [Gender::Male, Gender::Female] {
                for _ in 0..40 {
                    assert!(daily_fortune(&tally, gender, day) <= 100);
                    day = day.succ_opt().unwrap();
                }
            }
            for stem in stems {
                assert!(wealth_index(&tally, stem) <= 100);
            }
        }

        let all_metal = ElementTally::from_counts(0, 0, 0, 8, 0);
        assert_eq!(wealth_index(&all_metal, Stem::Geng), 100);
        let all_water = ElementTally::from_counts(0, 0, 0, 0, 8);
        assert_eq!(wealth_index(&all_water, Stem::Ren), 34);
    }

    #[test]
    fn test_fortune_single_element_charts() {
        // balance -10.48, date factor (1*3+2)%10=5 -> 0, water 8 for male -> -16
        let all_water = ElementTally::from_counts(0, 0, 0, 0, 8);
        assert_eq!(daily_fortune(&all_water, Gender::Male, ymd(2026, 1, 2)), 23);
        let all_fire = ElementTally::from_counts(0, 8, 0, 0, 0);
        assert_eq!(daily_fortune(&all_fire, Gender::Male, ymd(2026, 1, 2)), 55);
    }

    #[test]
    fn test_advice_order_and_fallback() {
        assert_eq!(advice(&ElementTally::from_counts(2, 1, 3, 0, 2)), vec![BALANCED_ADVICE]);
        assert_eq!(
            advice(&ElementTally::from_counts(0, 0, 0, 0, 8)),
            vec!["水元素偏强，适合灵活变通"]
        );
        // Exactly 4 is not strong.
        assert_eq!(advice(&ElementTally::from_counts(4, 4, 0, 0, 0)), vec![BALANCED_ADVICE]);
        // Earth has no advisory text.
        assert_eq!(advice(&ElementTally::from_counts(0, 0, 8, 0, 0)), vec![BALANCED_ADVICE]);
    }

    #[test]
    fn test_gender_parse() {
        assert_eq!(Gender::parse("male"), Gender::Male);
        assert_eq!(Gender::parse("female"), Gender::Female);
        assert_eq!(Gender::parse("Male"), Gender::Female);
        assert_eq!(Gender::parse(""), Gender::Female);
    }

    #[test]
    fn test_report_for_golden_date() {
        let report = FortuneReport::compute(ymd(1990, 1, 1), 0, Gender::Male, ymd(2026, 10, 17)).unwrap();

        assert_eq!(report.bazi.to_string(), "甲巳 甲子 己丑 己子");
        assert_eq!(report.elements.total(), 8);
        assert_eq!(report.fortune, 54);
        assert_eq!(report.wealth, 58);
        assert_eq!(report.advice, vec![BALANCED_ADVICE]);
        assert_eq!(report.day_master.stem, Stem::Ji);
        assert_eq!(report.day_master.element, Element::Earth);
        assert_eq!(report.day_master.strength, 100);
        assert_eq!(report.day_master.supported_by, Element::Fire);
        assert_eq!(report.day_master.feeds, Element::Metal);
        assert_eq!(report.day_master.controls, Element::Water);
        assert_eq!(report.day_master.controlled_by, Element::Wood);
        assert_eq!(report.balance.get(Element::Earth).percentage, 37.5);
    }

    fn pillar(stem: Stem, branch: Branch) -> Pillar {
        Pillar { stem, branch }
    }

    #[test]
    fn test_day_master_strength() {
        // 甲巳 甲子 己丑 己子: day 30 + hour stem 15 + day branch 20 = 115, capped.
        let (_, golden) = bazi::chart_for_solar(ymd(1990, 1, 1), 0).unwrap();
        assert_eq!(day_master_strength(&golden), 100);

        // Only the day stem itself backs 甲.
        let lone = BaziChart {
            year: pillar(Stem::Geng, Branch::Shen),
            month: pillar(Stem::Geng, Branch::Shen),
            day: pillar(Stem::Jia, Branch::Zi),
            hour: pillar(Stem::Geng, Branch::Shen),
        };
        assert_eq!(day_master_strength(&lone), 80);

        // Year stem 乙 adds 15; 酉 adds nothing.
        let supported = BaziChart {
            year: pillar(Stem::Yi, Branch::You),
            ..lone
        };
        assert_eq!(day_master_strength(&supported), 95);

        // Hour branch 寅 adds 10.
        let rooted = BaziChart {
            hour: pillar(Stem::Geng, Branch::Yin),
            ..lone
        };
        assert_eq!(day_master_strength(&rooted), 90);
    }
}
