pub mod ctf;

/// Relativistic electron wavelength, in Ångströms, for an accelerating voltage in kilovolts.
pub fn wavelength_in_angstroms(voltage_in_kilovolts: f64) -> f64 {
    let voltage = voltage_in_kilovolts * 1.0e3;
    12.264_259_2 / (voltage * (1.0 + 0.978_466e-6 * voltage)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wavelength_matches_tabulated_values() {
        assert!((wavelength_in_angstroms(300.0) - 0.019_687).abs() < 1e-5);
        assert!((wavelength_in_angstroms(200.0) - 0.025_079).abs() < 1e-5);
        assert!((wavelength_in_angstroms(100.0) - 0.037_014).abs() < 1e-5);
    }
}
