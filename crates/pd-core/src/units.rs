// pd-core/src/units.rs

use uom::si::f64::{
    Frequency as UomFrequency, Power as UomPower,
    ThermodynamicTemperature as UomThermodynamicTemperature, Time as UomTime,
};

// Public canonical unit types (SI, f64)
pub type Frequency = UomFrequency;
pub type Power = UomPower;
pub type Temperature = UomThermodynamicTemperature;
pub type Time = UomTime;

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn hz(v: f64) -> Frequency {
    use uom::si::frequency::hertz;
    Frequency::new::<hertz>(v)
}

#[inline]
pub fn w(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}

/// Raw kelvin value of a temperature.
#[inline]
pub fn kelvin_of(t: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::kelvin;
    t.get::<kelvin>()
}

/// Raw seconds value of a time.
#[inline]
pub fn seconds_of(t: Time) -> f64 {
    use uom::si::time::second;
    t.get::<second>()
}

/// Raw hertz value of a frequency.
#[inline]
pub fn hertz_of(f: Frequency) -> f64 {
    use uom::si::frequency::hertz;
    f.get::<hertz>()
}

/// Raw watt value of a power.
#[inline]
pub fn watts_of(p: Power) -> f64 {
    use uom::si::power::watt;
    p.get::<watt>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_round_trip() {
        assert_eq!(kelvin_of(k(300.0)), 300.0);
        assert_eq!(seconds_of(s(0.1)), 0.1);
        assert_eq!(hertz_of(hz(10.0)), 10.0);
        assert_eq!(watts_of(w(250.0)), 250.0);
    }
}
