//! Header synonyms for net-value tables.

/// Semantic role of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Valuation date.
    Date,
    /// Unit net value.
    NetValue,
    /// Cumulative unit net value.
    CumulativeNetValue,
    /// Day-over-day growth.
    GrowthRate,
}

/// Header substrings per column kind, checked top to bottom.
///
/// Specific names come first so that `累计净值` resolves to
/// [`ColumnKind::CumulativeNetValue`] before the generic `净值` rule sees it.
pub const COLUMN_RULES: &[(ColumnKind, &[&str])] = &[
    (
        ColumnKind::CumulativeNetValue,
        &["累计净值", "累计单位净值", "cumulative", "accumulated", "acc nav"],
    ),
    (
        ColumnKind::GrowthRate,
        &["增长率", "涨跌幅", "收益率", "growth", "change", "return"],
    ),
    (
        ColumnKind::Date,
        &["日期", "净值日", "估值日", "date", "时间"],
    ),
    (
        ColumnKind::NetValue,
        &["单位净值", "净值", "net value", "nav", "unit value"],
    ),
];

/// Classifies a header cell, case-insensitively and by substring.
#[must_use]
pub fn classify_header(header: &str) -> Option<ColumnKind> {
    let header = header.trim().to_lowercase();
    if header.is_empty() {
        return None;
    }
    COLUMN_RULES
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| header.contains(n)))
        .map(|(kind, _)| *kind)
}

/// Column positions of a recognized net-value table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnMap {
    /// Date column.
    pub date: Option<usize>,
    /// Net value column.
    pub net_value: Option<usize>,
    /// Cumulative net value column.
    pub cumulative: Option<usize>,
    /// Growth rate column.
    pub growth_rate: Option<usize>,
}

impl ColumnMap {
    /// Maps headers to columns; the first header of each kind wins.
    #[must_use]
    pub fn from_headers(headers: &[String]) -> Self {
        let mut map = Self::default();
        for (position, header) in headers.iter().enumerate() {
            let slot = match classify_header(header) {
                Some(ColumnKind::Date) => &mut map.date,
                Some(ColumnKind::NetValue) => &mut map.net_value,
                Some(ColumnKind::CumulativeNetValue) => &mut map.cumulative,
                Some(ColumnKind::GrowthRate) => &mut map.growth_rate,
                None => continue,
            };
            slot.get_or_insert(position);
        }
        map
    }

    /// True when a date column and at least one value column were found.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.date.is_some()
            && (self.net_value.is_some() || self.cumulative.is_some() || self.growth_rate.is_some())
    }
}
