use crate::hal::DisplaySink;

pub fn temperature_line(temperature_c: Option<f64>) -> String {
    match temperature_c {
        Some(temperature) => {
            // Keep "-0.0" off the panel for readings that round to zero.
            let rounded = (temperature * 10.0).round() / 10.0;
            let shown = if rounded == 0.0 { 0.0 } else { rounded };
            format!("Temp: {shown:.1} C")
        }
        None => "Temp: ERR".to_string(),
    }
}

pub fn compressor_line(compressor_on: bool) -> &'static str {
    if compressor_on {
        "Compressor: ON"
    } else {
        "Compressor: OFF"
    }
}

pub fn render<S: DisplaySink>(
    display: &mut S,
    temperature_c: Option<f64>,
    compressor_on: bool,
) -> Result<(), S::Error> {
    display.clear()?;
    display.set_cursor(0, 0)?;
    display.write_text(&temperature_line(temperature_c))?;
    display.set_cursor(1, 0)?;
    display.write_text(compressor_line(compressor_on))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::FakeDisplay;

    #[test]
    fn temperature_rounds_to_one_decimal() {
        assert_eq!(temperature_line(Some(-17.34)), "Temp: -17.3 C");
        assert_eq!(temperature_line(Some(-17.36)), "Temp: -17.4 C");
        assert_eq!(temperature_line(Some(4.0)), "Temp: 4.0 C");
        assert_eq!(temperature_line(Some(-0.04)), "Temp: 0.0 C");
    }

    #[test]
    fn failed_measurement_shows_error() {
        assert_eq!(temperature_line(None), "Temp: ERR");
    }

    #[test]
    fn renders_both_rows() {
        let mut display = FakeDisplay::default();

        render(&mut display, Some(-17.34), true).unwrap();

        assert_eq!(display.clears, 1);
        assert_eq!(display.rows[0], "Temp: -17.3 C");
        assert_eq!(display.rows[1], "Compressor: ON");

        render(&mut display, Some(-19.0), false).unwrap();

        assert_eq!(display.clears, 2);
        assert_eq!(display.rows[0], "Temp: -19.0 C");
        assert_eq!(display.rows[1], "Compressor: OFF");
    }

    #[test]
    fn display_errors_are_returned() {
        let mut display = FakeDisplay::failing();

        assert_eq!(render(&mut display, Some(1.0), false), Err("display not responding"));
        assert_eq!(display.clears, 0);
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(temperature_line(Some(-17.35)), "Temp: -17.4 C");
        assert_eq!(temperature_line(Some(0.15)), "Temp: 0.2 C");
        assert_eq!(temperature_line(Some(-0.04)), "Temp: 0.0 C");
    }
}
