//! Generic parameters functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use thiserror::Error;
use toml;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The software root environment variable (REPEAT_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot load the parameter file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file.
///
/// The file path is relative to the `<REPEAT_SW_ROOT>/params` directory.
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned,
{
    // Get the params dir
    let mut path = crate::host::get_repeat_sw_root().map_err(|_| LoadError::SwRootNotSet)?;
    path.push("params");
    path.push(param_file_path);

    // Load the file into a string
    let params_str = match read_to_string(path) {
        Ok(s) => s,
        Err(e) => return Err(LoadError::FileLoadError(e)),
    };

    // Parse the string into the parameter struct
    match toml::from_str(params_str.as_str()) {
        Ok(p) => Ok(p),
        Err(e) => Err(LoadError::DeserialiseError(e)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct TestParams {
        gain: f64,
        name: String,
    }

    #[test]
    fn test_load() {
        // Point the root at a temporary directory containing a params dir
        let root = std::env::temp_dir().join(format!("util_params_test_{}", std::process::id()));
        let params_dir = root.join("params");
        std::fs::create_dir_all(&params_dir).unwrap();
        std::fs::write(
            params_dir.join("test_params.toml"),
            "gain = 0.5\nname = \"test\"\n",
        )
        .unwrap();

        std::env::set_var(crate::host::SW_ROOT_ENV_VAR, &root);

        let params: TestParams = load("test_params.toml").unwrap();
        assert_eq!(params.gain, 0.5);
        assert_eq!(params.name, "test");

        assert!(load::<TestParams>("no_such_file.toml").is_err());
    }
}
