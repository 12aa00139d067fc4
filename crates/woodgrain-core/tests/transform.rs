// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End-to-end behavior of the two-pass transform.

#![allow(missing_docs, clippy::unwrap_used, clippy::float_cmp)]

use woodgrain_core::{
    sentinel, ConfigError, Diagnostic, NormalizeError, WoodGrain, WoodGrainConfig,
    WoodGrainError,
};

const EPS: f64 = 1e-9;

fn config(seed: u64) -> WoodGrainConfig {
    WoodGrainConfig {
        random_seed: seed,
        ..WoodGrainConfig::default()
    }
}

/// A small print: start G-code, `n` layers 0.2 mm apart, end G-code.
fn print_layers(n: usize) -> Vec<String> {
    let mut layers = vec!["; generated by test\nG90\nM104 S215\nG28\n".to_owned()];
    for i in 1..=n {
        let z = i as f64 * 0.2;
        layers.push(format!(
            ";LAYER:{i}\nG1 Z{z:.1} F3000\nG1 X10 Y10 E1\nG1 X20 Y10 E2\n"
        ));
    }
    layers.push("G91\nG1 Z10\nG90\nM104 S0\nM84\n".to_owned());
    layers
}

fn lines_of(layers: &[String]) -> Vec<String> {
    layers
        .iter()
        .flat_map(|l| l.lines().map(str::to_owned))
        .collect()
}

#[test]
fn scenario_four_heights_three_injections() {
    let config = WoodGrainConfig {
        discontinuity_threshold: 3.0,
        ..config(1234)
    };
    let layers = [
        "G90\nG1 Z0 F3000\nG1 X10 Y10\n",
        "G1 Z0.2\nG1 X20 Y10\n",
        "G1 Z2.5\nG1 X20 Y20\n",
        "G1 Z5.0\nG1 X10 Y20\n",
    ];
    let out = WoodGrain::new(config).run(&layers).unwrap();

    assert_eq!(
        out.noise.as_map().heights().collect::<Vec<_>>(),
        vec![0.0, 0.2, 2.5, 5.0]
    );
    let values: Vec<f64> = out.normalized.as_map().values().collect();
    assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
    assert!(values.iter().any(|&v| v == 0.0));
    assert!(values.iter().any(|&v| v == 1.0));

    assert_eq!(out.injected.len(), 3);
    assert_eq!(
        out.injected.iter().map(|i| i.z).collect::<Vec<_>>(),
        vec![0.2, 2.5, 5.0]
    );
    for injection in &out.injected {
        assert!((180..=230).contains(&injection.temperature));
    }
    // Height 0 is held by the startup block but still graphed.
    assert_eq!(out.graph.len(), 4);
    assert_eq!(out.graph.rows()[0].z, 0.0);
    assert_eq!(
        out.startup_temperature,
        Some(woodgrain_core::graph::whole_degrees(out.graph.rows()[0].temperature))
    );
    assert_eq!(out.layers.len(), layers.len());
}

#[test]
fn layer_count_is_preserved() {
    let layers = print_layers(12);
    let out = WoodGrain::new(config(5)).run(&layers).unwrap();
    assert_eq!(out.layers.len(), layers.len());
    assert!(out.layers[0].starts_with(";woodgrain:begin startup\n"));
    assert!(out.layers.last().unwrap().ends_with(";woodgrain:end graph\n"));
}

#[test]
fn injected_commands_follow_their_motion_line() {
    let layers = print_layers(4);
    let out = WoodGrain::new(config(9)).run(&layers).unwrap();
    let lines = lines_of(&out.layers);
    let tagged: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.starts_with("M104") && l.ends_with(sentinel::LINE_TAG))
        .map(|(ix, _)| ix)
        .collect();

    assert_eq!(tagged.len(), out.injected.len());
    for (ix, injection) in tagged.into_iter().zip(&out.injected) {
        assert_eq!(
            lines[ix],
            format!("M104 S{} ; woodgrain", injection.temperature)
        );
        assert!(lines[ix - 1].starts_with(&format!("G1 Z{:.1}", injection.z)));
    }
}

#[test]
fn rerun_on_own_output_is_stable() {
    let layers = print_layers(20);
    let engine = WoodGrain::new(WoodGrainConfig {
        max_upward: 4.0,
        ..config(77)
    });
    let first = engine.run(&layers).unwrap();
    let second = engine.run(&first.layers).unwrap();

    assert_eq!(first.injected, second.injected);
    assert_eq!(first.graph, second.graph);
    assert_eq!(first.layers, second.layers);
}

#[test]
fn temperatures_stay_in_range_and_rise_slowly() {
    let layers = print_layers(60);
    let out = WoodGrain::new(WoodGrainConfig {
        max_upward: 3.0,
        grain_size: 1.0,
        ..config(3)
    })
    .run(&layers)
    .unwrap();

    let temps: Vec<f64> = out.graph.rows().iter().map(|r| r.temperature).collect();
    for pair in temps.windows(2) {
        assert!(pair[1] <= pair[0] + 3.0 + EPS, "{pair:?}");
    }
    for t in temps {
        assert!((180.0 - EPS..=230.0 + EPS).contains(&t));
    }
}

#[test]
fn foreign_temperature_commands_are_replaced_until_the_last_patch() {
    let layers = print_layers(5);
    let out = WoodGrain::new(config(21)).run(&layers).unwrap();
    let lines = lines_of(&out.layers);

    // Start G-code's M104 S215 is superseded by the schedule.
    assert!(!lines.iter().any(|l| l == "M104 S215"));
    // The end G-code's cool-down comes after the last height change.
    assert!(lines.iter().any(|l| l == "M104 S0"));
    // Relative moves in the end G-code are not heights.
    assert!(!out.noise.as_map().contains(10.0));
    assert!(lines.iter().any(|l| l == "G1 Z10"));
}

#[test]
fn startup_block_follows_the_anchor_line() {
    let layers = [
        "; generated\n; set extruder 1\nG90\n".to_owned(),
        "G1 Z0.2\nG1 X1\n".to_owned(),
        "G1 Z0.4\nG1 X2\n".to_owned(),
    ];
    let out = WoodGrain::new(config(4)).run(&layers).unwrap();
    let first: Vec<&str> = out.layers[0].lines().collect();
    assert_eq!(first[0], "; generated");
    assert_eq!(first[1], "; set extruder 1");
    assert_eq!(first[2], ";woodgrain:begin startup");
    assert_eq!(first[3], "M230 S0");
    assert!(first[4].starts_with("M104 S"));
    assert_eq!(first[5], "M230 S1");
    assert_eq!(first[6], "M116");
    assert_eq!(first[7], ";woodgrain:end startup");
    assert_eq!(first[8], "G90");
}

#[test]
fn start_temperature_is_held_then_rate_limited() {
    let layers = print_layers(8);
    let out = WoodGrain::new(WoodGrainConfig {
        first_temp: 210.0,
        max_upward: 5.0,
        ..config(8)
    })
    .run(&layers)
    .unwrap();

    assert_eq!(out.startup_temperature, Some(210));
    // 0.2 and 0.4 mm sit inside the hold.
    assert!(out.injected.iter().all(|i| i.z > 0.5));
    let rows = out.graph.rows();
    assert_eq!((rows[0].z, rows[0].temperature), (0.2, 210.0));
    assert_eq!((rows[1].z, rows[1].temperature), (0.4, 210.0));
    // The held value seeds the rate limit for the first scheduled step.
    assert!(rows[2].temperature <= 215.0 + EPS);
}

#[test]
fn degenerate_noise_is_an_error() {
    // With a 0.5 mm grain, integer heights land on lattice points where the
    // noise is exactly zero.
    let err = WoodGrain::new(WoodGrainConfig {
        grain_size: 0.5,
        ..config(1)
    })
    .run(&["G1 Z1\n", "G1 Z2\n"])
    .unwrap_err();
    assert!(matches!(
        err,
        WoodGrainError::Normalize(NormalizeError::DegenerateRange { heights: 3, .. })
    ));
}

#[test]
fn configuration_errors_surface_before_any_output() {
    let err = WoodGrain::new(WoodGrainConfig {
        grain_size: 0.0,
        ..config(1)
    })
    .run(&print_layers(3))
    .unwrap_err();
    assert!(matches!(
        err,
        WoodGrainError::Config(ConfigError::NotPositive {
            field: "grainSize",
            ..
        })
    ));
}

#[test]
fn sparse_streams_warn_and_use_the_minimum() {
    let out = WoodGrain::new(config(2))
        .run(&["G28\nG1 X5 Y5\n"])
        .unwrap();
    assert_eq!(out.diagnostics, vec![Diagnostic::SparseHeights { heights: 1 }]);
    assert_eq!(out.startup_temperature, Some(180));
}

#[test]
fn malformed_heights_are_diagnosed() {
    let out = WoodGrain::new(config(6))
        .run(&["G1 Z0.2\n", "G1 Zbad\nG1 X1\n", "G1 Z0.4\n"])
        .unwrap();
    assert!(out
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::MalformedField { layer: 1, line: 0, .. })));
    assert_eq!(out.injected.len(), 2);
}

#[test]
fn unterminated_blocks_stop_at_the_next_foreign_command() {
    let layers = [
        "G1 Z0.2\n".to_owned(),
        ";woodgrain:begin graph\n;WoodGraph: stale\n".to_owned(),
        "G1 Z0.4\nG1 X2\n".to_owned(),
    ];
    let out = WoodGrain::new(config(10)).run(&layers).unwrap();
    assert_eq!(
        out.diagnostics,
        vec![Diagnostic::UnterminatedBlock { layer: 1, line: 0 }]
    );
    assert_eq!(out.layers[1], "");
    assert!(out.layers[2].starts_with("G1 Z0.4\nM104 S"));
    assert!(out.layers[2].contains("G1 X2\n"));
    assert_eq!(out.injected.len(), 2);
}

#[test]
fn unterminated_startup_block_keeps_the_toolpath() {
    let layers = [
        ";woodgrain:begin startup\nM230 S0\nG90\n".to_owned(),
        "G1 Z0.2\nG1 X1\n".to_owned(),
        "G1 Z0.4\nG1 X2\n".to_owned(),
        "G1 Z0.6\nG1 X3\nM104 S0\n".to_owned(),
    ];
    let out = WoodGrain::new(config(14)).run(&layers).unwrap();
    assert_eq!(
        out.diagnostics,
        vec![Diagnostic::UnterminatedBlock { layer: 0, line: 0 }]
    );
    assert_eq!(out.injected.len(), 3);

    let lines = lines_of(&out.layers);
    for kept in ["G90", "G1 Z0.2", "G1 X1", "G1 Z0.4", "G1 X2", "G1 Z0.6", "G1 X3", "M104 S0"] {
        assert!(lines.iter().any(|l| l == kept), "{kept} missing");
    }
    // The stale wait toggle went with its block; only the fresh one remains.
    assert_eq!(lines.iter().filter(|l| *l == "M230 S0").count(), 1);
    assert_eq!(
        lines.iter().filter(|l| *l == ";woodgrain:begin startup").count(),
        1
    );
}

#[test]
fn relative_moves_never_trigger_transitions() {
    // After 0.4 mm, a relative `Z0.2` names a known height but is a lift, not a layer.
    let layers = [
        "G1 Z0.2\nG1 X1\n",
        "G1 Z0.4\nG1 X2\n",
        "G91\nG1 Z0.2\nG90\nG1 X3\n",
        "G1 Z0.6\nG1 X4\n",
    ];
    let out = WoodGrain::new(config(15)).run(&layers).unwrap();
    assert_eq!(
        out.injected.iter().map(|i| i.z).collect::<Vec<_>>(),
        vec![0.2, 0.4, 0.6]
    );
    assert_eq!(
        out.graph.rows().iter().map(|r| r.z).collect::<Vec<_>>(),
        vec![0.2, 0.4, 0.6]
    );
    let third: Vec<&str> = out.layers[2].lines().collect();
    assert_eq!(third, vec!["G91", "G1 Z0.2", "G90", "G1 X3"]);
}

#[test]
fn every_injected_line_is_tagged() {
    let out = WoodGrain::new(config(12)).run(&print_layers(6)).unwrap();
    let mut depth = 0_i32;
    for line in lines_of(&out.layers) {
        match sentinel::classify(&line) {
            sentinel::Sentinel::BlockBegin => depth += 1,
            sentinel::Sentinel::BlockEnd => depth -= 1,
            sentinel::Sentinel::Injected | sentinel::Sentinel::Foreign => {
                if line.starts_with("M104") && depth == 0 && line != "M104 S0" {
                    assert!(line.ends_with(sentinel::LINE_TAG), "{line}");
                }
            }
        }
    }
    assert_eq!(depth, 0);
}
