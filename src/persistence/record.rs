//! Flattened section snapshot written once per sealed bucket

use serde::{Deserialize, Serialize};

use crate::common::traits::SectionGetter;

/// Window durations (seconds) that have a column triple in the snapshot table
pub const RECORDED_DURATIONS: [i64; 7] = [10, 30, 60, 300, 900, 3600, 14400];

/// Data columns of the snapshot table, in insert order
pub const COLUMNS: [&str; 22] = [
    "buy10",
    "sell10",
    "inflow10",
    "buy30",
    "sell30",
    "inflow30",
    "buy60",
    "sell60",
    "inflow60",
    "buy300",
    "sell300",
    "inflow300",
    "buy900",
    "sell900",
    "inflow900",
    "buy3600",
    "sell3600",
    "inflow3600",
    "buy14400",
    "sell14400",
    "inflow14400",
    "end_time",
];

/// One buy/sell/inflow triple per recorded duration plus the window end
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SectionRecord {
    pub id: i64,
    pub buy10: i64,
    pub sell10: i64,
    pub inflow10: i64,
    pub buy30: i64,
    pub sell30: i64,
    pub inflow30: i64,
    pub buy60: i64,
    pub sell60: i64,
    pub inflow60: i64,
    pub buy300: i64,
    pub sell300: i64,
    pub inflow300: i64,
    pub buy900: i64,
    pub sell900: i64,
    pub inflow900: i64,
    pub buy3600: i64,
    pub sell3600: i64,
    pub inflow3600: i64,
    pub buy14400: i64,
    pub sell14400: i64,
    pub inflow14400: i64,
    pub end_time: i64,
}

impl SectionRecord {
    /// Snapshot every recorded duration; untracked windows stay zero
    pub fn from_sections(sections: &dyn SectionGetter) -> Self {
        let mut record = SectionRecord::default();
        for duration in RECORDED_DURATIONS {
            let Some(section) = sections.section(duration) else {
                continue;
            };
            if let Some((buy, sell, inflow)) = record.triple_mut(duration) {
                *buy = section.buy;
                *sell = section.sell;
                *inflow = section.inflow;
            }
            record.end_time = record.end_time.max(section.end_time);
        }
        record
    }

    /// Buy, sell and inflow recorded for `duration`
    pub fn triple(&self, duration: i64) -> Option<(i64, i64, i64)> {
        let (buy, sell, inflow) = match duration {
            10 => (self.buy10, self.sell10, self.inflow10),
            30 => (self.buy30, self.sell30, self.inflow30),
            60 => (self.buy60, self.sell60, self.inflow60),
            300 => (self.buy300, self.sell300, self.inflow300),
            900 => (self.buy900, self.sell900, self.inflow900),
            3600 => (self.buy3600, self.sell3600, self.inflow3600),
            14400 => (self.buy14400, self.sell14400, self.inflow14400),
            _ => return None,
        };
        Some((buy, sell, inflow))
    }

    fn triple_mut(&mut self, duration: i64) -> Option<(&mut i64, &mut i64, &mut i64)> {
        match duration {
            10 => Some((&mut self.buy10, &mut self.sell10, &mut self.inflow10)),
            30 => Some((&mut self.buy30, &mut self.sell30, &mut self.inflow30)),
            60 => Some((&mut self.buy60, &mut self.sell60, &mut self.inflow60)),
            300 => Some((&mut self.buy300, &mut self.sell300, &mut self.inflow300)),
            900 => Some((&mut self.buy900, &mut self.sell900, &mut self.inflow900)),
            3600 => Some((&mut self.buy3600, &mut self.sell3600, &mut self.inflow3600)),
            14400 => Some((&mut self.buy14400, &mut self.sell14400, &mut self.inflow14400)),
            _ => None,
        }
    }

    /// Column values in [`COLUMNS`] order
    pub fn values(&self) -> [i64; 22] {
        [
            self.buy10,
            self.sell10,
            self.inflow10,
            self.buy30,
            self.sell30,
            self.inflow30,
            self.buy60,
            self.sell60,
            self.inflow60,
            self.buy300,
            self.sell300,
            self.inflow300,
            self.buy900,
            self.sell900,
            self.inflow900,
            self.buy3600,
            self.sell3600,
            self.inflow3600,
            self.buy14400,
            self.sell14400,
            self.inflow14400,
            self.end_time,
        ]
    }
}
