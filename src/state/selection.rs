use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::columns;

/// Height limits (pixels) of the pre-defined chart blocks.
pub const FIXED_HEIGHT_RANGE: std::ops::RangeInclusive<f32> = 300.0..=700.0;
/// Height limits (pixels) of the custom chart block.
pub const CUSTOM_HEIGHT_RANGE: std::ops::RangeInclusive<f32> = 300.0..=800.0;
pub const DEFAULT_HEIGHT: f32 = 500.0;

/// X axis choices of the pre-defined chart blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum XAxis {
    AgeDays,
    AgeWeeks,
    Testdate,
    Assay,
}

impl XAxis {
    pub const ALL: [XAxis; 4] = [XAxis::AgeDays, XAxis::AgeWeeks, XAxis::Testdate, XAxis::Assay];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn column(&self) -> &'static str {
        match self {
            XAxis::AgeDays => columns::AGE_DAYS,
            XAxis::AgeWeeks => columns::AGE_WEEKS,
            XAxis::Testdate => columns::TESTDATE,
            XAxis::Assay => columns::ASSAY,
        }
    }
}

/// Y axis choices of the pre-defined chart blocks. `ResultsCount` is the
/// synthetic per-group row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YAxis {
    MeanTiter,
    MinTiter,
    MaxTiter,
    Gmt,
    ResultsCount,
}

impl YAxis {
    pub const ALL: [YAxis; 5] = [
        YAxis::MeanTiter,
        YAxis::MinTiter,
        YAxis::MaxTiter,
        YAxis::Gmt,
        YAxis::ResultsCount,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn column(&self) -> &'static str {
        match self {
            YAxis::MeanTiter => columns::MEAN_TITER,
            YAxis::MinTiter => columns::MIN_TITER,
            YAxis::MaxTiter => columns::MAX_TITER,
            YAxis::Gmt => columns::GMT,
            YAxis::ResultsCount => columns::RESULTS_COUNT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupField {
    Testdate,
    Gmt,
    Assay,
    Result,
}

impl GroupField {
    pub const ALL: [GroupField; 4] = [
        GroupField::Testdate,
        GroupField::Gmt,
        GroupField::Assay,
        GroupField::Result,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            GroupField::Testdate => columns::TESTDATE,
            GroupField::Gmt => columns::GMT,
            GroupField::Assay => columns::ASSAY,
            GroupField::Result => columns::RESULT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorField {
    Assay,
    Result,
}

impl ColorField {
    pub const ALL: [ColorField; 2] = [ColorField::Assay, ColorField::Result];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn column(&self) -> &'static str {
        match self {
            ColorField::Assay => columns::ASSAY,
            ColorField::Result => columns::RESULT,
        }
    }
}

/// The closed set of chart constructors.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartKind {
    #[default]
    Line,
    Scatter,
    Bar,
    Box,
    Violin,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::Line,
        ChartKind::Scatter,
        ChartKind::Bar,
        ChartKind::Box,
        ChartKind::Violin,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::Line => "Line Chart",
            ChartKind::Scatter => "Scatter Plot",
            ChartKind::Bar => "Bar Chart",
            ChartKind::Box => "Box Plot",
            ChartKind::Violin => "Violin Plot",
        }
    }
}

/// Resolve default axis indices. Out-of-range indices are a caller error.
pub fn select_axes(x_default: usize, y_default: usize) -> Option<(XAxis, YAxis)> {
    Some((XAxis::from_index(x_default)?, YAxis::from_index(y_default)?))
}

/// Group-by options offered for a given y axis. Counting results always
/// offers `Result` as a key; the base list already contains it, so no
/// duplicate is ever added.
pub fn group_options(y_axis: YAxis) -> Vec<GroupField> {
    let mut options = GroupField::ALL.to_vec();
    if y_axis == YAxis::ResultsCount && !options.contains(&GroupField::Result) {
        options.push(GroupField::Result);
    }
    options
}

/// Resolve default grouping and coloring. Defaults not offered for `y_axis`
/// are dropped, duplicates keep their first position.
pub fn select_grouping(
    group_defaults: &[GroupField],
    color_default: usize,
    y_axis: YAxis,
) -> Option<(Vec<GroupField>, ColorField)> {
    let options = group_options(y_axis);
    let mut group_by = Vec::new();
    for field in group_defaults {
        if options.contains(field) && !group_by.contains(field) {
            group_by.push(*field);
        }
    }
    Some((group_by, ColorField::from_index(color_default)?))
}

/// Add `field` to an ordered selection, or remove it if already selected.
pub fn toggle_group<T: PartialEq>(group_by: &mut Vec<T>, field: T) {
    if let Some(pos) = group_by.iter().position(|f| *f == field) {
        group_by.remove(pos);
    } else {
        group_by.push(field);
    }
}

/// Selections of one pre-defined chart block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartBlockConfig {
    pub name: String,
    pub kind: ChartKind,
    pub visible: bool,
    pub x_axis: XAxis,
    pub y_axis: YAxis,
    pub group_by: Vec<GroupField>,
    pub color_by: ColorField,
    /// User-chosen inclusive date range; `None` means the full data range.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Edited title; `None` keeps the generated one.
    pub title: Option<String>,
    pub height: f32,
}

impl ChartBlockConfig {
    /// Build a block from default indices, as the dashboard layout declares
    /// them. Panics on indices outside the fixed option lists.
    pub fn predefined(
        name: &str,
        kind: ChartKind,
        axes: (usize, usize),
        group_defaults: &[GroupField],
        color_default: usize,
    ) -> Self {
        let (x_axis, y_axis) =
            select_axes(axes.0, axes.1).unwrap_or_else(|| panic!("invalid axis defaults for {name}"));
        let (group_by, color_by) = select_grouping(group_defaults, color_default, y_axis)
            .unwrap_or_else(|| panic!("invalid color default for {name}"));
        Self {
            name: name.to_string(),
            kind,
            visible: true,
            x_axis,
            y_axis,
            group_by,
            color_by,
            date_range: None,
            title: None,
            height: DEFAULT_HEIGHT,
        }
    }

    pub fn default_title(&self) -> String {
        format!("{}: {} vs. {}", self.name, self.y_axis.column(), self.x_axis.column())
    }

    pub fn effective_title(&self) -> String {
        self.title.clone().unwrap_or_else(|| self.default_title())
    }

    pub fn group_columns(&self) -> Vec<String> {
        self.group_by.iter().map(|g| g.column().to_string()).collect()
    }
}

/// Selections of the custom chart block, expressed as raw column names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomChartConfig {
    pub visible: bool,
    pub kind: ChartKind,
    pub x_axis: Option<String>,
    pub y_axis: Option<String>,
    pub group_by: Vec<String>,
    pub color_by: Option<String>,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub title: Option<String>,
    pub height: f32,
}

impl Default for CustomChartConfig {
    fn default() -> Self {
        Self {
            visible: false,
            kind: ChartKind::default(),
            x_axis: None,
            y_axis: None,
            group_by: Vec::new(),
            color_by: None,
            date_range: None,
            title: None,
            height: DEFAULT_HEIGHT,
        }
    }
}

/// Default custom selection over the columns of the loaded table: first
/// column on every axis, no grouping, line chart.
pub fn select_custom_axes(columns: &[String]) -> CustomChartConfig {
    let mut config = CustomChartConfig::default();
    config.reconcile(columns);
    config
}

impl CustomChartConfig {
    /// Drop selections naming columns the current table does not have and
    /// fill empty axis choices with the first column.
    pub fn reconcile(&mut self, columns: &[String]) {
        let first = columns.first().cloned();
        for slot in [&mut self.x_axis, &mut self.y_axis, &mut self.color_by] {
            let known = slot.as_ref().is_some_and(|c| columns.contains(c));
            if !known {
                *slot = first.clone();
            }
        }
        self.group_by.retain(|c| columns.contains(c));
    }

    pub fn default_title(&self) -> String {
        format!(
            "{}: {} vs. {}",
            self.kind.label(),
            self.y_axis.as_deref().unwrap_or_default(),
            self.x_axis.as_deref().unwrap_or_default()
        )
    }

    pub fn effective_title(&self) -> String {
        self.title.clone().unwrap_or_else(|| self.default_title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_indices_map_to_fixed_options() {
        assert_eq!(select_axes(2, 3), Some((XAxis::Testdate, YAxis::Gmt)));
        assert_eq!(select_axes(0, 4), Some((XAxis::AgeDays, YAxis::ResultsCount)));
        assert_eq!(select_axes(4, 0), None);
        assert_eq!(select_axes(0, 5), None);
    }

    #[test]
    fn group_options_never_repeat_result() {
        let counted = group_options(YAxis::ResultsCount);
        assert_eq!(counted, GroupField::ALL.to_vec());
        assert_eq!(group_options(YAxis::Gmt), GroupField::ALL.to_vec());
    }

    #[test]
    fn grouping_defaults_keep_order_and_drop_duplicates() {
        let (group_by, color) = select_grouping(
            &[GroupField::Assay, GroupField::Testdate, GroupField::Assay],
            1,
            YAxis::ResultsCount,
        )
        .unwrap();
        assert_eq!(group_by, vec![GroupField::Assay, GroupField::Testdate]);
        assert_eq!(color, ColorField::Result);
        assert!(select_grouping(&[], 2, YAxis::Gmt).is_none());
    }

    #[test]
    fn toggling_preserves_selection_order() {
        let mut groups = vec![GroupField::Testdate, GroupField::Gmt];
        toggle_group(&mut groups, GroupField::Assay);
        toggle_group(&mut groups, GroupField::Testdate);
        assert_eq!(groups, vec![GroupField::Gmt, GroupField::Assay]);
    }

    #[test]
    fn predefined_title_names_both_axes() {
        let block = ChartBlockConfig::predefined("Box plot", ChartKind::Box, (2, 3), &[], 0);
        assert_eq!(block.effective_title(), "Box plot: GMT vs. Testdate");
        assert_eq!(block.height, DEFAULT_HEIGHT);
    }

    #[test]
    fn custom_selection_follows_the_loaded_columns() {
        let columns: Vec<String> = ["Testdate", "Assay", "GMT"].iter().map(|s| s.to_string()).collect();
        let mut config = select_custom_axes(&columns);
        assert_eq!(config.x_axis.as_deref(), Some("Testdate"));
        assert_eq!(config.kind, ChartKind::Line);

        config.y_axis = Some("GMT".to_string());
        config.group_by = vec!["Assay".to_string(), "Lot".to_string()];
        config.reconcile(&columns);
        assert_eq!(config.y_axis.as_deref(), Some("GMT"));
        assert_eq!(config.group_by, vec!["Assay".to_string()]);

        let narrower = vec!["Assay".to_string()];
        config.reconcile(&narrower);
        assert_eq!(config.y_axis.as_deref(), Some("Assay"));
        assert!(config.group_by.iter().all(|c| narrower.contains(c)));
    }
}
