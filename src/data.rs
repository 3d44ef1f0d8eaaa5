// SPDX-License-Identifier: AGPL-3.0-only

//! JSON parameter files.
//!
//! A parameter file holds one serialized [`PrimaryParams`] record; see
//! the struct for field names. The tagged normalization serializes as
//! `{"norm": {"sigma8": 0.8}}` or `{"norm": {"primordial_amplitude": 2.2e-9}}`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::CosmoError;
use crate::params::PrimaryParams;

/// Load primary parameters from a JSON file.
///
/// # Errors
///
/// `CosmoError::DataLoad` on I/O or deserialization failure; the
/// message names the offending path.
pub fn load_params(path: &Path) -> Result<PrimaryParams, CosmoError> {
    let file = File::open(path).map_err(|e| {
        CosmoError::DataLoad(format!("cannot open {}: {e}", path.display()))
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| {
        CosmoError::DataLoad(format!("cannot parse {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Normalization;

    #[test]
    fn parses_full_record() {
        let json = r#"{
            "omega_c": 0.25,
            "omega_b": 0.05,
            "omega_k": 0.0,
            "n_nu_rel": 3.046,
            "n_nu_mass": 0.0,
            "mnu": 0.0,
            "w0": -1.0,
            "wa": 0.0,
            "h": 0.7,
            "norm": { "sigma8": 0.8 },
            "n_s": 0.96
        }"#;
        let p: PrimaryParams = serde_json::from_str(json).unwrap();
        assert_eq!(p.omega_c, 0.25);
        assert!(matches!(p.norm, Normalization::Sigma8(v) if v == 0.8));
        assert!(p.mgrowth.is_none(), "mgrowth defaults to absent");
    }

    #[test]
    fn parses_primordial_amplitude_and_mgrowth() {
        let json = r#"{
            "omega_c": 0.3, "omega_b": 0.045, "omega_k": 0.0,
            "n_nu_rel": 0.0, "n_nu_mass": 3.0, "mnu": 0.12,
            "w0": -0.95, "wa": 0.05, "h": 0.68,
            "norm": { "primordial_amplitude": 2.215e-9 },
            "n_s": 0.9619,
            "mgrowth": { "z": [0.0, 1.0], "df": [0.01, 0.02] }
        }"#;
        let p: PrimaryParams = serde_json::from_str(json).unwrap();
        assert!(matches!(
            p.norm,
            Normalization::PrimordialAmplitude(v) if v == 2.215e-9
        ));
        assert_eq!(p.mgrowth.unwrap().df, vec![0.01, 0.02]);
    }

    #[test]
    fn missing_file_is_data_load_error() {
        let err = load_params(Path::new("/nonexistent/params.json")).unwrap_err();
        assert!(matches!(err, CosmoError::DataLoad(_)));
    }

    #[test]
    fn round_trips_through_serde() {
        let p = PrimaryParams {
            omega_c: 0.25,
            omega_b: 0.05,
            omega_k: -0.01,
            n_nu_rel: 2.0328,
            n_nu_mass: 1.0,
            mnu: 0.06,
            w0: -1.0,
            wa: 0.0,
            h: 0.67,
            norm: Normalization::PrimordialAmplitude(2.1e-9),
            n_s: 0.965,
            mgrowth: None,
        };
        let json = serde_json::to_string(&p).unwrap();
        let back: PrimaryParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back.omega_k, p.omega_k);
        assert_eq!(back.norm, p.norm);
    }
}
