use super::Direction;

/// A `(subject, predicate, object, label)` 4-tuple of refs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quad<R> {
    pub subject: R,
    pub predicate: R,
    pub object: R,
    pub label: R,
}

impl<R: Clone> Quad<R> {
    /// Projects the quad along `dir`.
    pub fn direction(&self, dir: Direction) -> R {
        match dir {
            Direction::Subject => self.subject.clone(),
            Direction::Predicate => self.predicate.clone(),
            Direction::Object => self.object.clone(),
            Direction::Label => self.label.clone(),
        }
    }
}
