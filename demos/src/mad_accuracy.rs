// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Measures how far the sketch-based median absolute deviation strays from the exact value.
//!
//! Every run samples a fresh data set, computes the exact MAD by sorting, then estimates it
//! `--measurements` times: the values are shuffled, dealt round-robin over `--partitions`
//! partitions, collected, reduced and estimated. One JSON line is printed per run.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use clap::ValueEnum;
use madsketch::mad::Estimator;
use madsketch::mad::MadConfig;
use madsketch::mad::PartialResult;
use madsketch::mad::PartitionCollector;
use madsketch::mad::Reducer;
use madsketch::mad::SingleValuedColumn;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand_distr::Distribution as _;
use rand_distr::Normal;
use rand_distr::Pareto;
use rand_distr::Uniform;
use serde::Serialize;
use tracing::Level;
use tracing::error;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

/// Accuracy benchmark for the approximate median absolute deviation
#[derive(Parser, Debug)]
#[command(name = "mad_accuracy")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of values per data set
    #[arg(long, default_value = "100000")]
    size: usize,

    /// Distribution the values are drawn from
    #[arg(long, value_enum, default_value = "normal")]
    distribution: Distribution,

    /// How tightly the values are packed
    #[arg(long, value_enum, default_value = "dense")]
    density: Density,

    /// Compression of the rank sketches
    #[arg(long, default_value = "100")]
    compression: f64,

    /// Number of partitions the values are spread over
    #[arg(long, default_value = "5")]
    partitions: usize,

    /// Number of data sets to sample
    #[arg(long, default_value = "3")]
    runs: usize,

    /// Number of estimates per data set, each with a different spread over partitions
    #[arg(long, default_value = "10")]
    measurements: usize,

    /// Seed of the random generator
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: Level,
}

#[derive(ValueEnum, Serialize, Debug, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum Distribution {
    Uniform,
    Normal,
    Pareto,
}

#[derive(ValueEnum, Serialize, Debug, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum Density {
    Sparse,
    Dense,
}

impl Distribution {
    fn sample(self, size: usize, density: Density, rng: &mut StdRng) -> Vec<f64> {
        if size == 0 {
            return vec![];
        }
        let n = size as f64;
        match (self, density) {
            (Distribution::Uniform, Density::Dense) => {
                Uniform::new(-n / 4.0, n / 4.0).sample_iter(rng).take(size).collect()
            }
            (Distribution::Uniform, Density::Sparse) => {
                Uniform::new(-n * 2.0, n * 2.0).sample_iter(rng).take(size).collect()
            }
            (Distribution::Normal, density) => {
                let std_dev = match density {
                    Density::Dense => n / 2.0 / 3.0,
                    Density::Sparse => n * 4.0 / 3.0,
                };
                match Normal::new(0.0, std_dev) {
                    Ok(normal) => normal.sample_iter(rng).take(size).collect(),
                    Err(_) => vec![0.0; size],
                }
            }
            // the shape alone decides how heavy the tail is
            (Distribution::Pareto, density) => {
                let shape = match density {
                    Density::Dense => 10.0,
                    Density::Sparse => 0.1,
                };
                match Pareto::new(1.0, shape) {
                    Ok(pareto) => pareto.sample_iter(rng).take(size).collect(),
                    Err(_) => vec![1.0; size],
                }
            }
        }
    }
}

#[derive(Serialize, Debug)]
struct RunReport {
    size: usize,
    distribution: Distribution,
    density: Density,
    compression: f64,
    partitions: usize,
    seed: u64,
    run: usize,
    exact: f64,
    median_of_measurements: f64,
    mad_of_measurements: f64,
    absolute_error: f64,
    relative_error: f64,
    measurements: Vec<f64>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install log subscriber: {err}");
        return ExitCode::FAILURE;
    }

    if args.partitions == 0 {
        error!("--partitions must be at least 1");
        return ExitCode::FAILURE;
    }
    let config = match MadConfig::builder("mad", "value")
        .compression(args.compression)
        .build()
    {
        Ok(config) => Arc::new(config),
        Err(err) => {
            error!("invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Running {} runs: size={}, distribution={:?}, density={:?}, compression={}, partitions={}",
        args.runs, args.size, args.distribution, args.density, args.compression, args.partitions
    );

    let mut rng = StdRng::seed_from_u64(args.seed);
    for run in 0..args.runs {
        let mut values = args.distribution.sample(args.size, args.density, &mut rng);
        let exact = exact_mad(&values);

        let mut measurements = Vec::with_capacity(args.measurements);
        for _ in 0..args.measurements {
            values.shuffle(&mut rng);
            match estimate(&config, &values, args.partitions) {
                Ok(value) => measurements.push(value),
                Err(err) => {
                    error!("failed to reduce partial results: {err}");
                    return ExitCode::FAILURE;
                }
            }
        }

        let median_of_measurements = exact_median(&measurements);
        let absolute_error = (median_of_measurements - exact).abs();
        let report = RunReport {
            size: args.size,
            distribution: args.distribution,
            density: args.density,
            compression: args.compression,
            partitions: args.partitions,
            seed: args.seed,
            run,
            exact,
            median_of_measurements,
            mad_of_measurements: exact_mad(&measurements),
            absolute_error,
            relative_error: absolute_error / exact,
            measurements,
        };
        info!(run, exact, relative_error = report.relative_error, "finished run");
        match serde_json::to_string(&report) {
            Ok(line) => println!("{line}"),
            Err(err) => {
                error!("failed to render report: {err}");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

fn estimate(
    config: &Arc<MadConfig>,
    values: &[f64],
    partitions: usize,
) -> Result<f64, madsketch::error::Error> {
    let partials: Vec<PartialResult> = split_round_robin(values, partitions)
        .into_iter()
        .map(|values| {
            let column: SingleValuedColumn = values.into_iter().collect();
            let num_docs = column.num_docs() as u32;
            let mut collector = PartitionCollector::new(config.clone(), column);
            collector.start();
            for doc in 0..num_docs {
                collector.collect(doc);
            }
            collector.finish()
        })
        .collect();
    let merged = Reducer::new(config.clone()).reduce(partials)?;
    Ok(Estimator::value(&merged))
}

/// Deals `values` over `partitions` partitions like cards.
fn split_round_robin(values: &[f64], partitions: usize) -> Vec<Vec<f64>> {
    let mut split = vec![Vec::with_capacity(values.len() / partitions + 1); partitions];
    for (i, &value) in values.iter().enumerate() {
        split[i % partitions].push(value);
    }
    split
}

fn exact_median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn exact_mad(values: &[f64]) -> f64 {
    let median = exact_median(values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - median).abs()).collect();
    exact_median(&deviations)
}
