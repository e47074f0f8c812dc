//! Read-only challenge catalog and its on-disk loader.
//!
//! A challenge directory looks like:
//!
//! ```text
//! challenges/
//!   sorting/
//!     instructions.md
//!     starter.js
//!     tests.yaml
//! ```
//!
//! The directory name is the challenge name. `tests.yaml` is a list of
//! `{function, description, input, expected}` entries.

use crate::error::CatalogError;
use crate::types::{Challenge, TestCase};
use rand::Rng;
use rand::seq::IteratorRandom;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

pub const INSTRUCTIONS_FILE: &str = "instructions.md";
pub const STARTER_FILE: &str = "starter.js";
pub const TESTS_FILE: &str = "tests.yaml";

#[derive(Debug, Clone, Default)]
pub struct ChallengeCatalog {
    challenges: BTreeMap<String, Arc<Challenge>>,
}

impl ChallengeCatalog {
    pub fn from_challenges<I>(challenges: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = Challenge>,
    {
        let mut map = BTreeMap::new();
        for challenge in challenges {
            validate_challenge(&challenge)?;
            let name = challenge.name.clone();
            if map.insert(name.clone(), Arc::new(challenge)).is_some() {
                return Err(CatalogError::InvalidDefinition {
                    name,
                    message: "duplicate challenge name".to_string(),
                });
            }
        }
        Ok(Self { challenges: map })
    }

    /// Loads every subdirectory of `root` as a challenge. Broken challenge
    /// directories are logged and skipped; a missing root is an error.
    pub fn load_dir(root: &Path) -> Result<Self, CatalogError> {
        let entries = fs::read_dir(root).map_err(|err| CatalogError::Io {
            path: root.to_path_buf(),
            message: err.to_string(),
        })?;
        let mut dirs: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();

        let mut challenges = BTreeMap::new();
        for dir in dirs {
            match load_challenge(&dir) {
                Ok(challenge) => {
                    tracing::info!(
                        challenge = %challenge.name,
                        tests = challenge.test_cases.len(),
                        "loaded challenge"
                    );
                    challenges.insert(challenge.name.clone(), Arc::new(challenge));
                }
                Err(err) => {
                    tracing::error!(path = %dir.display(), error = %err, "skipping challenge");
                }
            }
        }
        if challenges.is_empty() {
            tracing::warn!(path = %root.display(), "challenge catalog is empty");
        }
        Ok(Self { challenges })
    }

    pub fn by_name(&self, name: &str) -> Option<Arc<Challenge>> {
        self.challenges.get(name).cloned()
    }

    pub fn random_challenge(&self) -> Result<Arc<Challenge>, CatalogError> {
        self.random_challenge_with(&mut rand::thread_rng())
    }

    pub fn random_challenge_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<Arc<Challenge>, CatalogError> {
        self.challenges
            .values()
            .choose(rng)
            .cloned()
            .ok_or(CatalogError::Empty)
    }

    /// Challenge names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.challenges.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }
}

fn load_challenge(dir: &Path) -> Result<Challenge, CatalogError> {
    let name = dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let description = read_file(dir, INSTRUCTIONS_FILE)?;
    let starter_code = read_file(dir, STARTER_FILE)?;
    let tests = read_file(dir, TESTS_FILE)?;
    let test_cases: Vec<TestCase> =
        serde_yaml::from_str(&tests).map_err(|err| CatalogError::InvalidDefinition {
            name: name.clone(),
            message: format!("{TESTS_FILE}: {err}"),
        })?;
    let challenge = Challenge {
        name,
        description,
        starter_code,
        test_cases,
    };
    validate_challenge(&challenge)?;
    Ok(challenge)
}

fn read_file(dir: &Path, file: &str) -> Result<String, CatalogError> {
    let path = dir.join(file);
    fs::read_to_string(&path).map_err(|err| CatalogError::Io {
        path,
        message: err.to_string(),
    })
}

fn validate_challenge(challenge: &Challenge) -> Result<(), CatalogError> {
    if challenge.name.trim().is_empty() {
        return Err(CatalogError::InvalidDefinition {
            name: challenge.name.clone(),
            message: "name must not be empty".to_string(),
        });
    }
    for (index, case) in challenge.test_cases.iter().enumerate() {
        if case.function.trim().is_empty() {
            return Err(CatalogError::InvalidDefinition {
                name: challenge.name.clone(),
                message: format!("test case {} has an empty function name", index + 1),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;
    use std::collections::HashSet;

    fn challenge(name: &str) -> Challenge {
        Challenge {
            name: name.to_string(),
            description: format!("# {name}"),
            starter_code: String::new(),
            test_cases: vec![TestCase {
                function: "solve".to_string(),
                description: "identity".to_string(),
                input: json!(1),
                expected: json!(1),
            }],
        }
    }

    fn write_challenge(root: &Path, name: &str, tests: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(INSTRUCTIONS_FILE), "Sort the numbers.").unwrap();
        fs::write(dir.join(STARTER_FILE), "function sortList(numbers) {}\n").unwrap();
        fs::write(dir.join(TESTS_FILE), tests).unwrap();
    }

    #[test]
    fn lookup_by_name() {
        let catalog = ChallengeCatalog::from_challenges([challenge("a"), challenge("b")]).unwrap();
        assert_eq!(catalog.by_name("b").unwrap().name, "b");
        assert!(catalog.by_name("missing").is_none());
        assert_eq!(catalog.names(), vec!["a", "b"]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = ChallengeCatalog::from_challenges([challenge("a"), challenge("a")]).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidDefinition { .. }));
    }

    #[test]
    fn empty_catalog_has_no_random_challenge() {
        let catalog = ChallengeCatalog::default();
        assert!(matches!(catalog.random_challenge(), Err(CatalogError::Empty)));
    }

    #[test]
    fn random_draw_reaches_every_challenge() {
        let catalog =
            ChallengeCatalog::from_challenges([challenge("a"), challenge("b"), challenge("c")])
                .unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let seen: HashSet<String> = (0..200)
            .map(|_| catalog.random_challenge_with(&mut rng).unwrap().name.clone())
            .collect();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn loads_challenge_directories() {
        let root = tempfile::tempdir().unwrap();
        write_challenge(
            root.path(),
            "sorting",
            r#"
- function: sortList
  description: sorts a short list
  input: [3, 1, 2]
  expected: [1, 2, 3]
- function: sortList
  description: keyword input
  input:
    numbers: [2, 1]
  expected: [1, 2]
"#,
        );
        let catalog = ChallengeCatalog::load_dir(root.path()).unwrap();
        let sorting = catalog.by_name("sorting").unwrap();
        assert_eq!(sorting.description, "Sort the numbers.");
        assert_eq!(sorting.test_cases.len(), 2);
        assert!(!sorting.test_cases[0].is_keyword_call());
        assert!(sorting.test_cases[1].is_keyword_call());
        assert_eq!(sorting.test_cases[1].input, json!({"numbers": [2, 1]}));
    }

    #[test]
    fn broken_directories_are_skipped() {
        let root = tempfile::tempdir().unwrap();
        write_challenge(
            root.path(),
            "good",
            "- {function: f, description: d, input: 1, expected: 1}\n",
        );
        write_challenge(root.path(), "missing_keys", "- {function: f, input: 1}\n");
        fs::create_dir_all(root.path().join("no_files")).unwrap();
        fs::write(root.path().join("stray.txt"), "ignored").unwrap();

        let catalog = ChallengeCatalog::load_dir(root.path()).unwrap();
        assert_eq!(catalog.names(), vec!["good"]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let err = ChallengeCatalog::load_dir(&root.path().join("nope")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
