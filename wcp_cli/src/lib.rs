//! Command-line front end for the wind farm cabling solvers.
//!
//! Everything user-facing lives here: flag parsing, GML input, strategy
//! construction from their textual names, and the CSV/GraphML outputs.
//! The algorithms themselves live in the `cabling` crate.

#[macro_use]
extern crate log;

pub mod build;
pub mod commands;
pub mod gml;
pub mod output;

use cabling::escape::{
    BonbonsEscape, EscapeStrategy, EscapingNcc, FreeCablesEscape, LeavesEscape, StrategyKeeper,
};
use cabling::ncc::{NegativeCycleCanceling, SingleRunNcc};
use cabling::report::{RunLogger, SummaryRow};
use clap::ArgMatches;
use std::path::PathBuf;
use windfarm::{Instance, Windfarm};

pub struct RunConfig {
    pub algorithm: String,
    pub input_file: PathBuf,
    pub output_dir: PathBuf,
    pub time_limit_ms: f64,
    pub seed: u64,
    pub init: String,
    pub delta: String,
    pub detect: String,
    pub iteration_limit: Option<usize>,
    pub weight_leaves: u32,
    pub weight_free_cables: u32,
    pub weight_bonbon: u32,
    pub weight_new_init: u32,
    pub print_solution: bool,
    pub print_summary: bool,
    pub print_details: bool,
}

fn parse_flag<T: std::str::FromStr>(matches: &ArgMatches, name: &str) -> Result<T, String> {
    matches
        .value_of(name)
        .expect("flag has a default value")
        .parse()
        .map_err(|_| format!("could not parse --{}", name))
}

pub fn config_from_matches(matches: &ArgMatches) -> Result<RunConfig, String> {
    let time_limit_ms = match matches.value_of("time") {
        Some(value) => {
            let seconds: f64 =
                value.parse().map_err(|_| "could not parse --time".to_string())?;
            if seconds <= 0.0 {
                return Err("the time limit must be positive".to_string());
            }
            seconds * 1000.0
        }
        None => f64::INFINITY,
    };
    let iteration_limit = match matches.value_of("iterations") {
        Some(value) => Some(
            value.parse::<usize>().map_err(|_| "could not parse --iterations".to_string())?,
        ),
        None => None,
    };

    Ok(RunConfig {
        algorithm: matches.value_of("algorithm").unwrap_or("NCC").to_string(),
        input_file: PathBuf::from(matches.value_of("inputFile").expect("flag has a default")),
        output_dir: PathBuf::from(matches.value_of("output").expect("flag has a default")),
        time_limit_ms,
        seed: parse_flag(matches, "seed")?,
        init: matches.value_of("init").expect("flag has a default").to_string(),
        delta: matches.value_of("delta").expect("flag has a default").to_string(),
        detect: matches.value_of("detect").expect("flag has a default").to_string(),
        iteration_limit,
        weight_leaves: parse_flag(matches, "escapeLeaves")?,
        weight_free_cables: parse_flag(matches, "escapeFreeCables")?,
        weight_bonbon: parse_flag(matches, "escapeBonbon")?,
        weight_new_init: parse_flag(matches, "escapeNewInit")?,
        print_solution: matches.is_present("print-solution"),
        print_summary: matches.is_present("print-summary"),
        print_details: matches.is_present("print-details"),
    })
}

/// Parses the input, runs the requested algorithm and writes the enabled
/// output files. Any error message is meant for stderr.
pub fn run(matches: &ArgMatches) -> Result<(), String> {
    let config = config_from_matches(matches)?;
    let instance = gml::read_instance(&config.input_file)?;
    log_instance_information(&config, &instance);

    let mut farm = Windfarm::new(&instance);
    let algorithm_name = format!("WCP-{}", config.algorithm);
    let mut logger = RunLogger::new(build_summary(&config, &instance, &algorithm_name));

    let max_flow_change = 2 * farm.cables().max_capacity();
    let init = build::build_initialization(&config.init, &farm)?;
    let delta = build::build_delta(&config.delta, config.seed, max_flow_change)?;
    let detection = build::build_detection(&config.detect, &farm)?;
    let core =
        NegativeCycleCanceling::new(&farm, init, delta, detection, config.time_limit_ms);

    let status = match config.algorithm.as_str() {
        "NCC" => SingleRunNcc::new(core).run(&mut farm, &mut logger),
        "EscapingNCC" => {
            let keeper = build_strategy_keeper(&config, &farm)?;
            EscapingNcc::new(&farm, core, keeper, config.iteration_limit)
                .run(&mut farm, &mut logger)
        }
        other => return Err(format!("unknown algorithm '{}'", other)),
    };
    info!(
        "RUN\tDONE\tstatus {}\tcost {}",
        status,
        farm.total_cost()
    );

    write_outputs(&config, &instance, &farm, &logger, &algorithm_name)
}

fn log_instance_information(config: &RunConfig, instance: &Instance) {
    info!(
        "RUN\t{}\ttestset {}\tinstance {}\t{} turbines\t{} substations\ttightness {:.3}",
        config.algorithm,
        instance.testset(),
        instance.instance(),
        instance.num_turbines(),
        instance.num_substations(),
        instance.capacity_tightness(),
    );
    let cables = instance.cables();
    debug!(
        "RUN\tCABLES\tcapacities {:?}\tcosts {:?}",
        cables.capacity_breakpoints(),
        cables.cost_breakpoints()
    );
}

fn build_summary(config: &RunConfig, instance: &Instance, algorithm_name: &str) -> SummaryRow {
    let run_name = format!(
        "{}-{}-{}-{}-{}",
        algorithm_name,
        instance.long_test_instance_string(),
        config.init,
        config.delta,
        config.detect
    );
    let mut summary = SummaryRow::new(run_name, instance.testset(), instance.instance());
    summary.initialization_strategy = config.init.clone();
    summary.delta_strategy = config.delta.clone();
    summary.detection_strategy = config.detect.clone();
    summary.num_turbines = instance.num_turbines();
    summary.num_substations = instance.num_substations();
    summary.num_edges = instance.num_edges();
    summary
}

fn build_strategy_keeper(config: &RunConfig, farm: &Windfarm) -> Result<StrategyKeeper, String> {
    let mut keeper = StrategyKeeper::new(config.seed);
    if config.weight_leaves > 0 {
        keeper.add_strategy(EscapeStrategy::Leaves(LeavesEscape::new(farm)), config.weight_leaves);
    }
    if config.weight_bonbon > 0 {
        keeper.add_strategy(EscapeStrategy::Bonbons(BonbonsEscape::new(farm)), config.weight_bonbon);
    }
    if config.weight_free_cables > 0 {
        keeper.add_strategy(
            EscapeStrategy::FreeCables(FreeCablesEscape::new(farm)),
            config.weight_free_cables,
        );
    }
    if config.weight_new_init > 0 {
        keeper.add_strategy(EscapeStrategy::NewInit { calls: 0 }, config.weight_new_init);
    }
    if keeper.is_empty() {
        return Err(
            "EscapingNCC needs at least one escaping strategy; set an --escape* weight".to_string(),
        );
    }
    Ok(keeper)
}

fn write_outputs(
    config: &RunConfig,
    instance: &Instance,
    farm: &Windfarm,
    logger: &RunLogger,
    algorithm_name: &str,
) -> Result<(), String> {
    let per_run_stem = format!(
        "{}-{}-{}-{}-{}",
        algorithm_name,
        instance.test_instance_string(),
        config.init,
        config.delta,
        config.detect
    );

    if config.print_summary {
        let path = config.output_dir.join(format!("{}-general.csv", algorithm_name));
        output::append_summary(&path, &logger.summary)
            .map_err(|error| format!("could not write '{}': {}", path.display(), error))?;
        info!("RUN\tSUMMARY\t{}", path.display());
    }
    if config.print_details {
        let path = config.output_dir.join(format!("{}.csv", per_run_stem));
        output::write_runtime_rows(&path, &logger.rows)
            .map_err(|error| format!("could not write '{}': {}", path.display(), error))?;
        info!("RUN\tDETAILS\t{}", path.display());
    }
    if config.print_solution {
        let path = config.output_dir.join(format!("{}.graphml", per_run_stem));
        output::write_graphml(&path, instance, farm)
            .map_err(|error| format!("could not write '{}': {}", path.display(), error))?;
        info!("RUN\tSOLUTION\t{}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parses_defaults() {
        let matches = commands::wcp_parser().get_matches_from(["wcp"]);
        let config = config_from_matches(&matches).unwrap();
        assert_eq!(config.algorithm, "NCC");
        assert!(config.time_limit_ms.is_infinite());
        assert_eq!(config.seed, 0);
        assert_eq!(config.iteration_limit, None);
        assert_eq!(config.weight_leaves, 0);
        assert!(!config.print_summary);
    }

    #[test]
    fn negative_time_limit_is_rejected() {
        let matches = commands::wcp_parser().get_matches_from(["wcp", "--time=-5"]);
        assert!(config_from_matches(&matches).is_err());
    }

    #[test]
    fn escaping_without_strategies_is_rejected() {
        let matches = commands::wcp_parser()
            .get_matches_from(["wcp", "-a", "EscapingNCC"]);
        let config = config_from_matches(&matches).unwrap();
        let farm = Windfarm::new(&{
            let mut instance = Instance::with_default_cables(0, 1);
            let t = instance.add_turbine(0.0, 0.0);
            let s = instance.add_substation(1.0, 0.0, 1);
            instance.add_edge(t, s);
            instance
        });
        assert!(build_strategy_keeper(&config, &farm).is_err());
    }
}
