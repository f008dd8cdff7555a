// Access Code Generator Port

use crate::domain::staff::{AccessCode, ACCESS_CODE_ALPHABET, ACCESS_CODE_LEN};
use rand::Rng;

/// Source of candidate staff access codes. Uniqueness is checked by the caller.
pub trait AccessCodeGenerator: Send + Sync {
    fn generate(&self) -> AccessCode;
}

/// Uniform random codes over `A-Z0-9` (production)
pub struct RandomAccessCodeGenerator;

impl AccessCodeGenerator for RandomAccessCodeGenerator {
    fn generate(&self) -> AccessCode {
        let mut rng = rand::thread_rng();
        let code: String = (0..ACCESS_CODE_LEN)
            .map(|_| {
                let idx = rng.gen_range(0..ACCESS_CODE_ALPHABET.len());
                ACCESS_CODE_ALPHABET[idx] as char
            })
            .collect();

        // Alphabet and length are fixed above, parsing cannot fail
        AccessCode::parse(&code).unwrap_or_else(|_| unreachable!("generated code {code}"))
    }
}

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed list of codes, then falls back to random ones
    pub struct ScriptedCodeGenerator {
        script: Mutex<VecDeque<AccessCode>>,
    }

    impl ScriptedCodeGenerator {
        pub fn new<I, S>(codes: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: AsRef<str>,
        {
            let script = codes
                .into_iter()
                .map(|c| AccessCode::parse(c.as_ref()).expect("valid scripted code"))
                .collect();
            Self {
                script: Mutex::new(script),
            }
        }
    }

    impl AccessCodeGenerator for ScriptedCodeGenerator {
        fn generate(&self) -> AccessCode {
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| RandomAccessCodeGenerator.generate())
        }
    }
}
