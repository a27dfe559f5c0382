use std::rc::Rc;

use reprise_core::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// How snapshots are copied out of, and back into, the tracked cell.
///
/// `json()` is the default. It deep-copies anything serde can round-trip, but
/// whatever the serde impls skip or default is silently lost. `strict_json()`
/// turns that loss into [`Error::CloneFailure`].
pub struct CloneFn<T>(Rc<dyn Fn(&T) -> Result<T>>);

impl<T> Clone for CloneFn<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> std::fmt::Debug for CloneFn<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CloneFn(..)")
    }
}

impl<T: 'static> CloneFn<T> {
    pub fn json() -> Self
    where
        T: Serialize + DeserializeOwned,
    {
        Self(Rc::new(json_round_trip))
    }

    pub fn strict_json() -> Self
    where
        T: Serialize + DeserializeOwned + PartialEq,
    {
        Self(Rc::new(|v: &T| {
            let copy = json_round_trip(v)?;
            if copy != *v {
                return Err(Error::CloneFailure(
                    "value does not survive a JSON round trip unchanged".into(),
                ));
            }
            Ok(copy)
        }))
    }

    /// `T::clone`. Shares whatever the `Clone` impl shares (`Rc` contents, ...).
    pub fn native() -> Self
    where
        T: Clone,
    {
        Self(Rc::new(|v: &T| Ok(v.clone())))
    }

    pub fn custom(f: impl Fn(&T) -> T + 'static) -> Self {
        Self(Rc::new(move |v: &T| Ok(f(v))))
    }

    pub fn fallible(f: impl Fn(&T) -> Result<T> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn apply(&self, value: &T) -> Result<T> {
        (self.0)(value)
    }
}

fn json_round_trip<T: Serialize + DeserializeOwned>(value: &T) -> Result<T> {
    let json = serde_json::to_value(value).map_err(|e| Error::CloneFailure(e.to_string()))?;
    serde_json::from_value(json).map_err(|e| Error::CloneFailure(e.to_string()))
}
