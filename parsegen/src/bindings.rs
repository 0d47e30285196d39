/// Variables bound by a parse routine.
///
/// Speculation runs against the caller's bindings directly. A mark is taken
/// beforehand and rewound to if the attempt fails, so repeated bindings only
/// ever grow by the values of the attempt in progress.
pub trait Bindings {
    type Mark;

    fn mark(&self) -> Self::Mark;

    /// Restore the bindings to how they were when `mark` was taken.
    fn rewind(&mut self, mark: Self::Mark);
}

impl Bindings for () {
    type Mark = ();

    fn mark(&self) {}

    fn rewind(&mut self, _mark: ()) {}
}

/// Values are only ever pushed while speculating, so truncating is enough.
impl<T> Bindings for Vec<T> {
    type Mark = usize;

    fn mark(&self) -> usize {
        self.len()
    }

    fn rewind(&mut self, mark: usize) {
        self.truncate(mark);
    }
}

impl<T: Clone> Bindings for Option<T> {
    type Mark = Option<T>;

    fn mark(&self) -> Option<T> {
        self.clone()
    }

    fn rewind(&mut self, mark: Option<T>) {
        *self = mark;
    }
}
