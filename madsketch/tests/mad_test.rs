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

mod common;

use std::sync::Arc;

use common::collect_partition;
use common::config;
use common::exact_mad;
use googletest::assert_that;
use googletest::prelude::near;
use insta::assert_snapshot;
use madsketch::error::ErrorKind;
use madsketch::mad::Estimator;
use madsketch::mad::FnValueSource;
use madsketch::mad::MadConfig;
use madsketch::mad::MadResponse;
use madsketch::mad::MultiValuedColumn;
use madsketch::mad::PartialResult;
use madsketch::mad::PartitionCollector;
use madsketch::mad::Reducer;
use madsketch::mad::ValueFormat;

#[test]
fn test_exact_reference() {
    assert_eq!(exact_mad(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]), 1.5);
    assert_eq!(exact_mad(&[10.0, 20.0, 30.0]), 10.0);
    assert_eq!(exact_mad(&[1.0, 1.0, 1.0, 1.0]), 0.0);
}

#[test]
fn test_single_partition_with_outlier() {
    let config = config();
    let partial = collect_partition(&config, &[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]);
    let value = Estimator::value(&partial);
    assert_that!(value, near(1.5, 0.05 * 1.5));
    assert_eq!(value, 1.5);
}

#[test]
fn test_constant_partitions() {
    let config = config();
    let partials = vec![
        collect_partition(&config, &[1.0, 1.0, 1.0, 1.0]),
        collect_partition(&config, &[1.0, 1.0, 1.0, 1.0]),
    ];
    let merged = Reducer::new(config).reduce(partials).unwrap();
    assert_eq!(merged.size(), 8);
    assert_eq!(Estimator::value(&merged), 0.0);
}

#[test]
fn test_empty_partition_is_neutral() {
    let config = config();
    let partials = vec![
        collect_partition(&config, &[]),
        collect_partition(&config, &[10.0, 20.0, 30.0]),
    ];
    let merged = Reducer::new(config.clone()).reduce(partials).unwrap();
    assert_eq!(Estimator::value(&merged), exact_mad(&[10.0, 20.0, 30.0]));

    let reversed = vec![
        collect_partition(&config, &[10.0, 20.0, 30.0]),
        collect_partition(&config, &[]),
    ];
    let merged = Reducer::new(config).reduce(reversed).unwrap();
    assert_eq!(Estimator::value(&merged), 10.0);
}

#[test]
fn test_all_partitions_empty() {
    let config = Arc::new(
        MadConfig::builder("mad", "value")
            .format(ValueFormat::Decimal { scale: 2 })
            .build()
            .unwrap(),
    );
    let partials = (0..4).map(|_| collect_partition(&config, &[])).collect();
    let merged = Reducer::new(config).reduce(partials).unwrap();
    assert!(merged.is_empty());
    assert!(Estimator::value(&merged).is_nan());

    let response = Estimator::response(&merged);
    assert_eq!(response, MadResponse::default());
    assert_snapshot!(response.to_json(), @r#"{"value":null}"#);
}

#[test]
fn test_partials_survive_transport() {
    let config = config();
    let partials: Vec<PartialResult> = [
        vec![1.0, 2.0, 3.0],
        vec![],
        vec![4.0, 5.0, 100.0],
        vec![7.0],
    ]
    .iter()
    .map(|values| collect_partition(&config, values))
    .map(|partial| PartialResult::deserialize(&partial.serialize()).unwrap())
    .collect();

    let local: Vec<PartialResult> = [
        vec![1.0, 2.0, 3.0],
        vec![],
        vec![4.0, 5.0, 100.0],
        vec![7.0],
    ]
    .iter()
    .map(|values| collect_partition(&config, values))
    .collect();

    let reducer = Reducer::new(config);
    let remote = reducer.reduce(partials).unwrap();
    let local = reducer.reduce(local).unwrap();
    assert_eq!(remote.size(), 7);
    assert_eq!(Estimator::value(&remote), Estimator::value(&local));
}

#[test]
fn test_reduce_is_repeatable_on_shared_inputs() {
    let config = config();
    let partials = vec![
        collect_partition(&config, &[1.0, 2.0]),
        collect_partition(&config, &[3.0, 4.0]),
    ];
    let reducer = Reducer::new(config);
    let first = reducer.reduce(partials.clone()).unwrap();
    let second = reducer.reduce(partials.clone()).unwrap();
    assert_eq!(Estimator::value(&first), Estimator::value(&second));
    // inputs are not modified by reduction
    assert_eq!(partials[0].size(), 2);
    assert_eq!(partials[1].size(), 2);
}

#[test]
fn test_reduce_rejects_foreign_partial() {
    let config = config();
    let other = Arc::new(MadConfig::builder("other", "value").build().unwrap());
    let partials = vec![
        collect_partition(&config, &[1.0]),
        collect_partition(&other, &[2.0]),
    ];
    let err = Reducer::new(config).reduce(partials).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InconsistentPartialResults);
}

#[test]
fn test_multi_valued_and_scripted_sources() {
    let config = config();

    let column = MultiValuedColumn::from_docs([vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 100.0]]);
    let mut multi = PartitionCollector::new(config.clone(), column);
    multi.start();
    for doc in 0..3 {
        multi.collect(doc);
    }

    let script = FnValueSource::new(|doc: u32| if doc % 2 == 0 { vec![doc as f64] } else { vec![] });
    let mut scripted = PartitionCollector::new(config.clone(), script);
    scripted.start();
    for doc in 0..10 {
        scripted.collect(doc);
    }

    let multi = multi.finish();
    let scripted = scripted.finish();
    assert_eq!(multi.size(), 6);
    assert_eq!(Estimator::value(&multi), 1.5);
    // 0, 2, 4, 6, 8
    assert_eq!(scripted.size(), 5);
    assert_eq!(Estimator::value(&scripted), 2.0);
}

#[test]
fn test_config_errors_precede_collection() {
    let err = MadConfig::from_json(r#"{"name": "mad", "field": "value", "compression": 0}"#)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    assert_snapshot!(
        err.to_string(),
        @"InvalidParameter, context: { aggregation: mad } => [compression] must be greater than 0, found [0]"
    );

    let err = MadConfig::from_json(r#"{"name": "mad"}"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
}

#[test]
fn test_decimal_response() {
    let config = Arc::new(
        MadConfig::from_json(
            r#"{"name": "mad", "field": "value", "format": {"decimal": {"scale": 2}}}"#,
        )
        .unwrap(),
    );
    let partial = collect_partition(&config, &[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]);
    let merged = Reducer::new(config).reduce(vec![partial]).unwrap();
    let response = Estimator::response(&merged);
    assert_snapshot!(response.to_json(), @r#"{"value":1.5,"value_as_string":"1.50"}"#);

    let parsed = MadResponse::from_json(&response.to_json()).unwrap();
    assert_eq!(parsed, response);
    assert_eq!(parsed.mad(), 1.5);
}
