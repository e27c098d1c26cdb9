use crate::object::Object;
use ahash::AHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Handle to a scope. Closures keep one alive for as long as they exist.
pub type Env = Rc<RefCell<Environment>>;

#[derive(Default)]
pub struct Environment {
    enclosing: Option<Env>,
    values: AHashMap<String, Object>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            enclosing: None,
            values: AHashMap::new(),
        }
    }

    pub fn with(enclosing: Env) -> Self {
        Environment {
            enclosing: Some(enclosing),
            values: AHashMap::new(),
        }
    }

    pub fn new_shared() -> Env {
        Rc::new(RefCell::new(Environment::new()))
    }

    pub fn enclosed_by(enclosing: &Env) -> Env {
        Rc::new(RefCell::new(Environment::with(Rc::clone(enclosing))))
    }

    /// Binds `key` in this scope only. A binding of the same name further out is shadowed, never
    /// overwritten.
    pub fn set(&mut self, key: &str, value: Object) {
        self.values.insert(String::from(key), value);
    }

    pub fn get(&self, key: &str) -> Option<Object> {
        if let Some(val) = self.values.get(key) {
            Some(val.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.as_ref().borrow().get(key)
        } else {
            None
        }
    }

    #[cfg(test)]
    fn contains_local(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

// Bindings may hold closures that point back at this very scope, so only the shape is printed.
impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.values.keys().collect();
        names.sort();

        f.debug_struct("Environment")
            .field("names", &names)
            .field("enclosed", &self.enclosing.is_some())
            .finish()
    }
}
