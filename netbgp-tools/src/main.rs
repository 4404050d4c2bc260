//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod config;
mod document;

use std::path::Path;

use clap::{App, Arg};
use config::{Config, LoggingFmtStyle};
use document::{Document, RouteEntry};
use netbgp_policy::catalog::{Catalog, Lookup};
use netbgp_policy::eval::{self, Decision, EvalConfig};
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::Layer;
use tracing_subscriber::prelude::*;

fn init_tracing(config: &config::Logging) {
    // Enable logging to a file.
    let file = config.file.enabled.then(|| {
        let file_appender = rolling::never(&config.file.dir, &config.file.name);
        let log_level_filter = LevelFilter::from_level(tracing::Level::TRACE);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(false)
            .with_thread_ids(config.file.fmt.show_thread_id)
            .with_file(config.file.fmt.show_source)
            .with_line_number(config.file.fmt.show_source)
            .with_ansi(config.file.fmt.colors);
        let layer = match config.file.fmt.style {
            LoggingFmtStyle::Compact => layer.compact().boxed(),
            LoggingFmtStyle::Full => layer.boxed(),
            LoggingFmtStyle::Json => layer.json().boxed(),
            LoggingFmtStyle::Pretty => layer.pretty().boxed(),
        };
        layer.with_filter(log_level_filter)
    });

    // Enable logging to stderr, keeping stdout for the decisions.
    let stderr = config.stderr.enabled.then(|| {
        let log_level_filter = LevelFilter::from_level(tracing::Level::TRACE);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(config.stderr.fmt.show_thread_id)
            .with_file(config.stderr.fmt.show_source)
            .with_line_number(config.stderr.fmt.show_source)
            .with_ansi(config.stderr.fmt.colors);
        let layer = match config.stderr.fmt.style {
            LoggingFmtStyle::Compact => layer.compact().boxed(),
            LoggingFmtStyle::Full => layer.boxed(),
            LoggingFmtStyle::Json => layer.json().boxed(),
            LoggingFmtStyle::Pretty => layer.pretty().boxed(),
        };
        layer.with_filter(log_level_filter)
    });

    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive("netbgp=debug".parse().unwrap())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(env_filter)
        .with(file)
        .with(stderr)
        .init();
}

// Finalizes every chain of the catalog, reporting all validation errors.
//
// Returns whether all chains were finalized.
fn finalize(catalog: &Catalog) -> bool {
    let failed = catalog.finalize_all();
    for (chain, errors) in &failed {
        for error in errors {
            error.log(chain);
            eprintln!("{chain}: {error}");
        }
    }
    failed.is_empty()
}

// Evaluates every route entry, printing one decision per entry.
//
// Returns the number of entries that couldn't be evaluated.
fn evaluate(
    catalog: &Catalog,
    routes: &[RouteEntry],
    config: &EvalConfig,
) -> usize {
    let mut faults = 0;

    for entry in routes {
        let prefix = entry.route.prefix;
        let Some(policy) = catalog.routing_policy(&entry.policy) else {
            error!(policy = %entry.policy, "unknown routing policy");
            println!("{prefix} {}: unknown routing policy", entry.policy);
            faults += 1;
            continue;
        };

        let family = entry.family();
        match eval::evaluate(policy, &entry.route, family, catalog, config) {
            Ok(Decision::Permit(route)) => {
                let attrs = serde_json::to_string(&route)
                    .unwrap_or_else(|error| error.to_string());
                println!("{prefix} {}: PERMIT {attrs}", entry.policy);
            }
            Ok(Decision::Deny) => {
                println!("{prefix} {}: DENY", entry.policy);
            }
            Err(error) => {
                error.log();
                println!("{prefix} {}: FAULT ({error})", entry.policy);
                faults += 1;
            }
        }
    }

    faults
}

// ===== main =====

fn main() {
    // Parse command-line parameters.
    let matches = App::new("BGP routing policy checker")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("file")
                .help("Specify an alternative configuration file."),
        )
        .arg(
            Arg::with_name("document")
                .short("d")
                .long("document")
                .value_name("file")
                .required(true)
                .help("Policy document (JSON) to validate."),
        )
        .arg(
            Arg::with_name("routes")
                .short("r")
                .long("routes")
                .value_name("file")
                .help("Routes (JSON) to evaluate against the policy document."),
        )
        .get_matches();

    // Read configuration file.
    let config_file = matches.value_of("config");
    let config = Config::load(config_file);

    // Initialize tracing.
    init_tracing(&config.logging);

    // Load the policy document.
    let document = matches
        .value_of("document")
        .map(Path::new)
        .expect("missing required argument");
    let catalog = match Document::load(document)
        .and_then(Document::into_catalog)
    {
        Ok(catalog) => catalog,
        Err(error) => {
            error.log();
            eprintln!("{error}");
            std::process::exit(1);
        }
    };
    info!(
        prefix_lists = catalog.prefix_lists().count(),
        routing_policies = catalog.routing_policies().count(),
        "policy document loaded"
    );

    // Validate all chains.
    let mut success = finalize(&catalog);

    // Evaluate routes.
    if let Some(routes) = matches.value_of("routes").map(Path::new) {
        let routes = match RouteEntry::load(routes) {
            Ok(routes) => routes,
            Err(error) => {
                error.log();
                eprintln!("{error}");
                std::process::exit(1);
            }
        };

        let eval_config = config.evaluation.eval_config();
        if evaluate(&catalog, &routes, &eval_config) > 0 {
            success = false;
        }
    }

    if !success {
        std::process::exit(1);
    }
}
