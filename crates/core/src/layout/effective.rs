use crate::model::{LayoutConfig, TimelineItem, ViewContext};

use super::overlap::YearRange;

/// Estimated rendered label width in pixels.
pub fn label_width_px(label: &str, config: &LayoutConfig) -> f64 {
    label.chars().count() as f64 * config.char_width_px + config.label_padding_px
}

/// The item's time interval widened to the width of its label.
///
/// Without a usable view (zero width or range) or when zoomed out past the
/// label threshold, labels are not drawn and the raw interval is returned.
/// Otherwise the label's pixel width is converted to years and, if wider
/// than the raw span, the interval is expanded symmetrically around the
/// raw midpoint.
pub fn effective_range(item: &TimelineItem, view: &ViewContext, config: &LayoutConfig) -> YearRange {
    let (start, end) = item.time_span(view.current_year);
    let raw = YearRange::new(f64::from(start), f64::from(end));
    if !view.labels_visible(config) {
        return raw;
    }

    let label_years = label_width_px(item.display_label(), config) * view.years_per_px();
    if label_years <= raw.span() {
        return raw;
    }
    let mid = raw.midpoint();
    YearRange::new(mid - label_years / 2.0, mid + label_years / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LayoutConfig {
        LayoutConfig::default()
    }

    #[test]
    fn raw_range_without_view() {
        let item = TimelineItem::person("a", 1800, Some(1850)).with_label("A very long label");
        let range = effective_range(&item, &ViewContext::unscaled(2024), &config());
        assert_eq!(range, YearRange::new(1800.0, 1850.0));
    }

    #[test]
    fn raw_range_when_zoomed_out() {
        let item = TimelineItem::event("e", 1066, None).with_label("Hastings");
        let view = ViewContext::new(1000.0, 2000.0).with_current_year(2024);
        assert_eq!(
            effective_range(&item, &view, &config()),
            YearRange::new(1066.0, 1066.0)
        );
    }

    #[test]
    fn short_event_widened_to_label() {
        // "Hastings": 8 chars * 7 + 16 = 72px; 72 / 1000px * 100y = 7.2y.
        let item = TimelineItem::event("e", 1066, None).with_label("Hastings");
        let view = ViewContext::new(1000.0, 100.0).with_current_year(2024);
        let range = effective_range(&item, &view, &config());
        assert!((range.start - 1062.4).abs() < 1e-9);
        assert!((range.end - 1069.6).abs() < 1e-9);
    }

    #[test]
    fn long_span_unchanged_by_short_label() {
        let item = TimelineItem::person("p", 1800, Some(1900)).with_label("Ann");
        let view = ViewContext::new(1000.0, 500.0).with_current_year(2024);
        assert_eq!(
            effective_range(&item, &view, &config()),
            YearRange::new(1800.0, 1900.0)
        );
    }

    #[test]
    fn short_label_preferred_for_width() {
        let item = TimelineItem::person("p", 1800, Some(1801))
            .with_label("Johann Wolfgang von Goethe")
            .with_short_label("Goethe");
        let view = ViewContext::new(1000.0, 100.0).with_current_year(2024);
        let range = effective_range(&item, &view, &config());
        // "Goethe": 6 * 7 + 16 = 58px -> 5.8y
        assert!((range.span() - 5.8).abs() < 1e-9);
    }
}
