/* ********************************************************************** **
**  This file is part of nnip.                                            **
**                                                                        **
**  nnip is free software: you can redistribute it and/or modify it under **
**  the terms of the GNU General Public License as published by the Free  **
**  Software Foundation, either version 3 of the License, or (at your     **
**  option) any later version.                                            **
**                                                                        **
**      http://www.gnu.org/licenses/                                      **
**                                                                        **
** Do note that, while the whole of nnip is licensed under the GPL, many  **
** parts of it are licensed under more permissive terms.                  **
** ********************************************************************** */

use crate::FailResult;
use crate::cmd::{self, Structure};
use crate::filetypes::StructureFile;
use crate::logging::init_global_logger;
use crate::model::read_model;

use clap::{App, Arg};
use std::ffi::OsStr;
use std::path::Path;

fn wrap_result_main<F>(main: F)
where F: FnOnce() -> FailResult<()>,
{
    main().unwrap_or_else(|e| {
        for cause in e.iter_chain() {
            error!("{}", cause);
        }

        if std::env::var_os("RUST_BACKTRACE") == Some(OsStr::new("1").to_owned()) {
            error!("{}", e.backtrace());
        } else {
            error!("\
                (If you found the above error message to be particularly lacking in \
                detail, try again with RUST_BACKTRACE=1)\
            ");
        }
        std::process::exit(1);
    });
}

// %% CRATES: binary: nnip-eval %%
pub fn nnip_eval() {
    let matches = App::new("nnip-eval")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Evaluate a neural-network potential on a structure and print the results as JSON.")
        .args(&[
            Arg::with_name("config")
                .short("c").long("config").value_name("MODEL")
                .takes_value(true).required(true)
                .help("model file (YAML or JSON)"),
            Arg::with_name("structure")
                .value_name("STRUCTURE")
                .required(true)
                .help("structure JSON file with species, positions, and optional contributing flags"),
            Arg::with_name("parallel")
                .long("parallel")
                .help("use rayon for neighbor lists and for the compute call"),
            Arg::with_name("log")
                .long("log").value_name("FILE")
                .takes_value(true)
                .help("also write the log to this file"),
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("more logging (may be repeated)"),
        ])
        .get_matches();

    wrap_result_main(|| {
        init_global_logger(matches.value_of_os("log").map(Path::new), matches.occurrences_of("verbose"))?;

        // both are required, so clap guarantees their presence
        let model_path = Path::new(matches.value_of_os("config").unwrap_or_default());
        let structure_path = Path::new(matches.value_of_os("structure").unwrap_or_default());
        let parallel = matches.is_present("parallel");

        let mut host = read_model(model_path)?;
        if parallel {
            host.model.set_parallel(true);
        }
        let structure = Structure::resolve(&StructureFile::load(structure_path)?, &host)?;
        info!("{} atoms, {} contributing", structure.positions.len(), structure.contributing.iter().filter(|&&c| c).count());

        let output = cmd::evaluate(&host, &structure, parallel)?;

        let stdout = std::io::stdout();
        output.save(stdout.lock())
    });
}
