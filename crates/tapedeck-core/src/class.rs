//! Runtime error-class descriptors
//!
//! Errors raised by third-party SDKs are identified by the class that raised
//! them, not by a Rust type. An [`ErrorType`] records a class name, the
//! module that defines it, and its declared bases in order. The method
//! resolution order is computed once, with C3 linearization, when the class
//! is created, so ancestor walks are a plain slice iteration afterwards.

use std::borrow::Cow;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Shared handle to an error class
pub type ErrorTypeRef = Arc<ErrorType>;

/// Failure to build an error class from its declared bases
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MroError {
    /// The same base was listed more than once
    #[error("duplicate base class '{base}' for '{class}'")]
    DuplicateBase { class: String, base: String },

    /// The declared bases admit no consistent linearization
    #[error("cannot create a consistent method resolution order for '{class}'")]
    Inconsistent { class: String },
}

/// An error class: name, defining module and linearized ancestry
pub struct ErrorType {
    name: Cow<'static, str>,
    module: Cow<'static, str>,
    bases: Vec<ErrorTypeRef>,
    /// Ancestors in resolution order, excluding the class itself
    ancestors: Vec<ErrorTypeRef>,
}

impl ErrorType {
    /// Create a class without bases
    pub fn root(name: impl Into<Cow<'static, str>>, module: impl Into<Cow<'static, str>>) -> ErrorTypeRef {
        Arc::new(Self {
            name: name.into(),
            module: module.into(),
            bases: Vec::new(),
            ancestors: Vec::new(),
        })
    }

    /// Create a class with exactly one base
    ///
    /// Single inheritance always linearizes, so this cannot fail.
    pub fn subclass(
        name: impl Into<Cow<'static, str>>,
        module: impl Into<Cow<'static, str>>,
        base: &ErrorTypeRef,
    ) -> ErrorTypeRef {
        let mut ancestors = Vec::with_capacity(base.ancestors.len() + 1);
        ancestors.push(Arc::clone(base));
        ancestors.extend(base.ancestors.iter().cloned());

        Arc::new(Self {
            name: name.into(),
            module: module.into(),
            bases: vec![Arc::clone(base)],
            ancestors,
        })
    }

    /// Create a class with several bases, in declaration order
    ///
    /// # Errors
    ///
    /// Returns an error if a base is repeated or the bases cannot be
    /// linearized consistently
    pub fn with_bases(
        name: impl Into<Cow<'static, str>>,
        module: impl Into<Cow<'static, str>>,
        bases: &[ErrorTypeRef],
    ) -> Result<ErrorTypeRef, MroError> {
        let name = name.into();
        let module = module.into();
        let qualname = qualify(&module, &name);

        for (i, base) in bases.iter().enumerate() {
            if bases[..i].iter().any(|earlier| earlier.same_class(base)) {
                return Err(MroError::DuplicateBase {
                    class: qualname,
                    base: base.qualname(),
                });
            }
        }

        let mut sequences: Vec<VecDeque<ErrorTypeRef>> = bases
            .iter()
            .map(|base| {
                let mut seq = VecDeque::with_capacity(base.ancestors.len() + 1);
                seq.push_back(Arc::clone(base));
                seq.extend(base.ancestors.iter().cloned());
                seq
            })
            .collect();
        sequences.push(bases.iter().cloned().collect());

        let ancestors = c3_merge(sequences).ok_or(MroError::Inconsistent { class: qualname })?;

        Ok(Arc::new(Self {
            name,
            module,
            bases: bases.to_vec(),
            ancestors,
        }))
    }

    /// Class name, e.g. `NotFoundError`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Defining module path, e.g. `openai._exceptions`
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Module-qualified name, the identity used by lookup tables
    pub fn qualname(&self) -> String {
        qualify(&self.module, &self.name)
    }

    /// Declared bases, in declaration order
    pub fn bases(&self) -> &[ErrorTypeRef] {
        &self.bases
    }

    /// Walk the class and its ancestors in method resolution order
    pub fn mro(&self) -> impl Iterator<Item = &Self> {
        std::iter::once(self).chain(self.ancestors.iter().map(|class| &**class))
    }

    /// Whether `other` appears anywhere in this class's resolution order
    pub fn is_subclass_of(&self, other: &Self) -> bool {
        self.mro().any(|class| class.same_class(other))
    }

    /// Class identity: same module and same name
    pub fn same_class(&self, other: &Self) -> bool {
        self.name == other.name && self.module == other.module
    }
}

impl fmt::Debug for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorType")
            .field("qualname", &self.qualname())
            .field("mro", &self.mro().map(Self::name).collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn qualify(module: &str, name: &str) -> String {
    if module.is_empty() {
        name.to_owned()
    } else {
        format!("{module}.{name}")
    }
}

/// C3 merge: repeatedly take the first head that is not in the tail of any sequence
fn c3_merge(mut sequences: Vec<VecDeque<ErrorTypeRef>>) -> Option<Vec<ErrorTypeRef>> {
    let mut merged = Vec::new();

    loop {
        sequences.retain(|seq| !seq.is_empty());
        if sequences.is_empty() {
            return Some(merged);
        }

        let candidate = sequences
            .iter()
            .filter_map(|seq| seq.front())
            .find(|head| {
                !sequences
                    .iter()
                    .any(|seq| seq.iter().skip(1).any(|tail| tail.same_class(head)))
            })
            .cloned()?;

        for seq in &mut sequences {
            if seq.front().is_some_and(|head| head.same_class(&candidate)) {
                seq.pop_front();
            }
        }

        merged.push(candidate);
    }
}
