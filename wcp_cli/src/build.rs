//! Construction of the strategy objects from their command-line names.

use cabling::bellman_ford::{SideTripFreeBellmanFord, StandardBellmanFord};
use cabling::delta::{
    DecreasingDelta, DeltaStrategy, IncreasingDecreasingDelta, IncreasingDelta, RandomDelta,
    SameNextDelta,
};
use cabling::dijkstra::{Dijkstra, EdgeMetric, Target};
use cabling::init::{Collecting, InitializationStrategy, NonCollecting};
use cabling::CycleDetection;
use windfarm::Windfarm;

fn init_format_error(input: &str) -> String {
    format!(
        "could not identify an initialization strategy from '{}'; \
         expected '(COLLECTING)?(DIJKSTRA|BFS)(ANY|LAST)'",
        input
    )
}

pub fn build_initialization(
    input: &str,
    farm: &Windfarm,
) -> Result<Box<dyn InitializationStrategy>, String> {
    let mut rest = input;

    let target = if let Some(stripped) = rest.strip_suffix("ANY") {
        rest = stripped;
        Target::AnyFreeSubstation
    } else if let Some(stripped) = rest.strip_suffix("LAST") {
        rest = stripped;
        Target::LastFreeSubstation
    } else {
        return Err(init_format_error(input));
    };

    let metric = if let Some(stripped) = rest.strip_suffix("BFS") {
        rest = stripped;
        EdgeMetric::Unit
    } else if let Some(stripped) = rest.strip_suffix("DIJKSTRA") {
        rest = stripped;
        EdgeMetric::Euclidean
    } else {
        return Err(init_format_error(input));
    };

    let dijkstra = Dijkstra::new(farm, metric);
    match rest {
        "COLLECTING" => Ok(Box::new(Collecting::new(dijkstra, target, farm))),
        "" => Ok(Box::new(NonCollecting::new(dijkstra, target))),
        _ => Err(init_format_error(input)),
    }
}

fn delta_format_error(input: &str) -> String {
    format!(
        "could not identify a delta strategy from '{}'; \
         expected '(STAY)?(INC|DEC|INCDEC|RANDOM)'",
        input
    )
}

pub fn build_delta(
    input: &str,
    seed: u64,
    max_flow_change: i32,
) -> Result<Box<dyn DeltaStrategy>, String> {
    let mut rest = input;

    let inner: Box<dyn DeltaStrategy> = if let Some(stripped) = rest.strip_suffix("INCDEC") {
        rest = stripped;
        Box::new(IncreasingDecreasingDelta::new(max_flow_change))
    } else if let Some(stripped) = rest.strip_suffix("INC") {
        rest = stripped;
        Box::new(IncreasingDelta::new(max_flow_change))
    } else if let Some(stripped) = rest.strip_suffix("DEC") {
        rest = stripped;
        Box::new(DecreasingDelta::new(max_flow_change))
    } else if let Some(stripped) = rest.strip_suffix("RANDOM") {
        rest = stripped;
        Box::new(RandomDelta::new(max_flow_change, seed))
    } else {
        return Err(delta_format_error(input));
    };

    match rest {
        "STAY" => Ok(Box::new(SameNextDelta::new(inner))),
        "" => Ok(inner),
        _ => Err(delta_format_error(input)),
    }
}

pub fn build_detection(input: &str, farm: &Windfarm) -> Result<Box<dyn CycleDetection>, String> {
    match input {
        "STFBF" => Ok(Box::new(SideTripFreeBellmanFord::new(farm))),
        "BF" => Ok(Box::new(StandardBellmanFord::new(farm))),
        _ => Err(format!(
            "could not identify a detection strategy from '{}'; expected 'BF' or 'STFBF'",
            input
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cabling::mocks;

    #[test]
    fn initialization_strings_parse() {
        let farm = mocks::single_link_farm();
        for input in ["DIJKSTRAANY", "DIJKSTRALAST", "BFSANY", "BFSLAST",
                      "COLLECTINGDIJKSTRAANY", "COLLECTINGBFSLAST"] {
            assert!(build_initialization(input, &farm).is_ok(), "{}", input);
        }
        for input in ["DIJKSTRA", "ANY", "COLLECTING", "XDIJKSTRAANY", ""] {
            assert!(build_initialization(input, &farm).is_err(), "{}", input);
        }
    }

    #[test]
    fn delta_strings_parse() {
        for input in ["INC", "DEC", "INCDEC", "RANDOM", "STAYINC", "STAYDEC",
                      "STAYINCDEC", "STAYRANDOM"] {
            let strategy = build_delta(input, 0, 30);
            assert!(strategy.is_ok(), "{}", input);
            assert_eq!(strategy.unwrap().max_flow_change(), 30);
        }
        for input in ["", "STAY", "UP", "INCSTAY"] {
            assert!(build_delta(input, 0, 30).is_err(), "{}", input);
        }
    }

    #[test]
    fn detection_strings_parse() {
        let farm = mocks::single_link_farm();
        assert!(build_detection("BF", &farm).is_ok());
        assert!(build_detection("STFBF", &farm).is_ok());
        assert!(build_detection("BELLMANFORD", &farm).is_err());
    }
}
