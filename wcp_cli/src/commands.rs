use clap::{Arg, Command};

pub fn wcp_parser() -> Command<'static> {
    Command::new("wcp")
        .version("0.1")
        .about("Computes a low-cost cable layout for a wind farm by negative cycle canceling.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .multiple_occurrences(true)
                .help("Verbose mode. Prints real-time information from the algorithm."),
        )
        .arg(
            Arg::new("algorithm")
                .short('a')
                .long("algorithm")
                .takes_value(true)
                .default_value("NCC")
                .help("Choose which algorithm to run: NCC or EscapingNCC."),
        )
        .arg(
            Arg::new("inputFile")
                .short('f')
                .long("inputFile")
                .value_name("FILE")
                .takes_value(true)
                .default_value("testset-0-instance-1.gml")
                .help("The GML instance on which to run the algorithm."),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .takes_value(true)
                .default_value("./")
                .help("Directory where output files are written."),
        )
        .arg(
            Arg::new("time")
                .short('z')
                .long("time")
                .value_name("SECONDS")
                .takes_value(true)
                .help("Maximum running time in seconds (default: no time limit)."),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .takes_value(true)
                .default_value("0")
                .help("Integer seed for all random decisions."),
        )
        .arg(
            Arg::new("init")
                .long("init")
                .takes_value(true)
                .default_value("DIJKSTRAANY")
                .help("Initialization strategy of form '(COLLECTING)?(DIJKSTRA|BFS)(ANY|LAST)'."),
        )
        .arg(
            Arg::new("delta")
                .long("delta")
                .takes_value(true)
                .default_value("INC")
                .help("Delta strategy of form '(STAY)?(INC|DEC|INCDEC|RANDOM)'."),
        )
        .arg(
            Arg::new("detect")
                .long("detect")
                .takes_value(true)
                .default_value("STFBF")
                .help("Negative cycle detection variant: 'STFBF' or 'BF'."),
        )
        .arg(
            Arg::new("iterations")
                .short('l')
                .long("iterations")
                .takes_value(true)
                .help("Maximum number of escaping iterations (default: infinity)."),
        )
        .arg(
            Arg::new("escapeLeaves")
                .long("escapeLeaves")
                .takes_value(true)
                .default_value("0")
                .help("Weight of escaping strategy: Move Leaf."),
        )
        .arg(
            Arg::new("escapeFreeCables")
                .long("escapeFreeCables")
                .takes_value(true)
                .default_value("0")
                .help("Weight of escaping strategy: Free Cable Upgrade."),
        )
        .arg(
            Arg::new("escapeBonbon")
                .long("escapeBonbon")
                .takes_value(true)
                .default_value("0")
                .help("Weight of escaping strategy: Cancel Bonbon."),
        )
        .arg(
            Arg::new("escapeNewInit")
                .long("escapeNewInit")
                .takes_value(true)
                .default_value("0")
                .help("Weight of escaping strategy: New Initialization."),
        )
        .arg(
            Arg::new("print-solution")
                .long("print-solution")
                .help("Write a GraphML file with the best solution."),
        )
        .arg(
            Arg::new("print-summary")
                .long("print-summary")
                .help("Append a summary line to the overview file after termination."),
        )
        .arg(
            Arg::new("print-details")
                .long("print-details")
                .help("Write a CSV file with per-iteration runtime data."),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_in_place() {
        let matches = wcp_parser().get_matches_from(["wcp"]);
        assert_eq!(matches.value_of("algorithm"), Some("NCC"));
        assert_eq!(matches.value_of("inputFile"), Some("testset-0-instance-1.gml"));
        assert_eq!(matches.value_of("init"), Some("DIJKSTRAANY"));
        assert_eq!(matches.value_of("delta"), Some("INC"));
        assert_eq!(matches.value_of("detect"), Some("STFBF"));
        assert_eq!(matches.value_of("seed"), Some("0"));
        assert_eq!(matches.value_of("escapeLeaves"), Some("0"));
        assert!(!matches.is_present("print-summary"));
    }

    #[test]
    fn flags_parse() {
        let matches = wcp_parser().get_matches_from([
            "wcp",
            "-a",
            "EscapingNCC",
            "-f",
            "testset-2-instance-9.gml",
            "-z",
            "30",
            "--seed",
            "7",
            "--escapeLeaves",
            "2",
            "--print-summary",
            "-vv",
        ]);
        assert_eq!(matches.value_of("algorithm"), Some("EscapingNCC"));
        assert_eq!(matches.value_of("time"), Some("30"));
        assert_eq!(matches.value_of("escapeLeaves"), Some("2"));
        assert!(matches.is_present("print-summary"));
        assert_eq!(matches.occurrences_of("verbose"), 2);
    }
}
