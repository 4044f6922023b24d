use crate::storage::EdgeFlags;

/// Turns an edge's length and flags into the cost minimised by a search.
pub trait Weighting {
    /// Cost of traversing `distance` meters of an edge with `flags`.
    fn weight(&self, distance: f64, flags: EdgeFlags) -> f64;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Minimises distance.
#[derive(Clone, Copy, Debug, Default)]
pub struct Shortest;

impl Weighting for Shortest {
    fn weight(&self, distance: f64, _flags: EdgeFlags) -> f64 {
        distance
    }

    fn name(&self) -> &'static str {
        "shortest"
    }
}

/// Minimises travel time, approximated as distance over the stored speed part.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fastest;

impl Weighting for Fastest {
    fn weight(&self, distance: f64, flags: EdgeFlags) -> f64 {
        match flags.speed_part() {
            0 => f64::INFINITY,
            part => distance / f64::from(part),
        }
    }

    fn name(&self) -> &'static str {
        "fastest"
    }
}

impl<W: Weighting + ?Sized> Weighting for &W {
    fn weight(&self, distance: f64, flags: EdgeFlags) -> f64 {
        (**self).weight(distance, flags)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Seconds needed to drive `distance` meters at the speed stored in `flags`.
pub fn travel_time(distance: f64, flags: EdgeFlags) -> f64 {
    match flags.speed_kmh() {
        0 => f64::INFINITY,
        speed => distance * 3.6 / f64::from(speed),
    }
}
