use crate::metrics::ChartDatum;

/// Largest value in the chart, floored at 1.0 so empty charts still scale
pub fn compute_chart_scale(data: &[ChartDatum]) -> f64 {
    let highest = data.iter().map(|d| d.value).fold(0.0_f64, f64::max);
    if highest < 1.0 {
        1.0
    } else {
        highest
    }
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

/// Horizontal bar rows, one per datum, bars at most `width` cells long
pub fn render_bars(data: &[ChartDatum], width: usize) -> Vec<String> {
    let scale = compute_chart_scale(data);
    let label_width = data.iter().map(|d| d.label.chars().count()).max().unwrap_or(0);

    data.iter()
        .map(|d| {
            let cells = ((d.value / scale) * width as f64).round() as usize;
            format!(
                "{:>lw$} | {} {}",
                d.label,
                "#".repeat(cells.min(width)),
                format_label(d.value),
                lw = label_width
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_chart_scale_empty() {
        assert_eq!(compute_chart_scale(&[]), 1.0);
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }

    #[test]
    fn bars_scale_to_largest_value() {
        let data = vec![
            ChartDatum::new("Monday", 10.0),
            ChartDatum::new("Friday", 5.0),
            ChartDatum::new("Sunday", 0.0),
        ];
        let rows = render_bars(&data, 10);
        assert_eq!(rows[0], "Monday | ########## 10");
        assert_eq!(rows[1], "Friday | ##### 5");
        assert_eq!(rows[2], "Sunday |  0");
    }
}
