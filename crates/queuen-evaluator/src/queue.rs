use std::cell::RefCell;
use std::rc::Rc;
use triomphe::Arc;

/// A lazy stream whose elements are themselves queues.
///
/// Every queue supports two operations: [`Queue::next`] advances the stream
/// and yields an element or `None` for exhaustion, and [`Queue::copy`]
/// returns an independent queue equivalent in remaining output to the
/// receiver at the moment of the call.
///
/// The variant set is closed: every operator of the language maps onto one
/// of these. Exhaustion is an ordinary value, not an error.
#[derive(Debug)]
pub enum Queue {
    /// The empty queue. `copy` is itself; `next` is exhausted.
    Empty,
    /// A finite ordered sequence of element queues.
    Literal { elements: Vec<Queue>, index: usize },
    /// `value` occurrences of [`Queue::Empty`].
    Natural { value: u64, index: u64 },
    /// One `Natural(codepoint)` per character.
    String { value: String, index: usize },
    /// Infinite; every `next` is a fresh copy of a template frozen at
    /// construction time.
    SafeFactory { template: Arc<Queue> },
    /// Infinite; every `next` copies whatever the shared template currently
    /// is.
    UnsafeFactory { template: Rc<RefCell<Queue>> },
    /// `first` until it exhausts, then `second`.
    Concat { first: Box<Queue>, second: Box<Queue> },
    /// Pairs of elements, each pair concatenated; exhausts with either
    /// side.
    Zip { first: Box<Queue>, second: Box<Queue> },
    /// The inner queues of `outer`, laid end to end.
    Flatten { outer: Box<Queue>, current: Box<Queue> },
    /// At most `remaining` more elements; one probe pull past the budget
    /// decides `halted`.
    Take {
        inner: Box<Queue>,
        remaining: usize,
        halted: bool,
    },
}

impl Queue {
    pub fn natural(value: u64) -> Queue {
        Queue::Natural { value, index: 0 }
    }

    pub fn string(value: impl Into<String>) -> Queue {
        Queue::String {
            value: value.into(),
            index: 0,
        }
    }

    pub fn literal(elements: Vec<Queue>) -> Queue {
        Queue::Literal { elements, index: 0 }
    }

    pub fn concat(first: Queue, second: Queue) -> Queue {
        Queue::Concat {
            first: Box::new(first),
            second: Box::new(second),
        }
    }

    pub fn zip(first: Queue, second: Queue) -> Queue {
        Queue::Zip {
            first: Box::new(first),
            second: Box::new(second),
        }
    }

    pub fn flatten(outer: Queue) -> Queue {
        Queue::Flatten {
            outer: Box::new(outer),
            current: Box::new(Queue::Empty),
        }
    }

    /// Captures a copy of `template` now; later changes to the original do
    /// not affect what the factory emits.
    pub fn safe_factory(template: &Queue) -> Queue {
        Queue::SafeFactory {
            template: Arc::new(template.copy()),
        }
    }

    /// Holds the live handle; every emission copies the template as it
    /// stands at that moment.
    pub fn unsafe_factory(template: Rc<RefCell<Queue>>) -> Queue {
        Queue::UnsafeFactory { template }
    }

    pub fn take(inner: Queue, budget: usize) -> Queue {
        Queue::Take {
            inner: Box::new(inner),
            remaining: budget,
            halted: false,
        }
    }

    /// `first * second`: `second`-many independent copies of `first`, each
    /// concatenated onto the corresponding element of `second`.
    pub fn star(first: Queue, second: Queue) -> Queue {
        let factory = Queue::safe_factory(&first);
        Queue::flatten(Queue::zip(second, factory))
    }

    /// Advance the stream. `None` is exhaustion, which is ordinary
    /// control flow here, not an error.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Queue> {
        match self {
            Queue::Empty => None,
            Queue::Literal { elements, index } => {
                let element = elements.get(*index)?;
                *index += 1;
                Some(element.copy())
            }
            Queue::Natural { value, index } => {
                if index < value {
                    *index += 1;
                    Some(Queue::Empty)
                } else {
                    None
                }
            }
            Queue::String { value, index } => {
                let c = value[*index..].chars().next()?;
                *index += c.len_utf8();
                Some(Queue::natural(c as u64))
            }
            Queue::SafeFactory { template } => Some(template.copy()),
            Queue::UnsafeFactory { template } => Some(template.borrow().copy()),
            Queue::Concat { first, second } => first.next().or_else(|| second.next()),
            Queue::Zip { first, second } => {
                // Exhaustion of `first` is deliberately not caught to fall
                // back to `second`: a zip ends with either side.
                let front = first.next()?;
                let back = second.next()?;
                Some(Queue::concat(front, back))
            }
            Queue::Flatten { outer, current } => loop {
                if let Some(element) = current.next() {
                    return Some(element);
                }
                // Exhaustion of the outer queue propagates.
                **current = outer.next()?;
            },
            Queue::Take {
                inner,
                remaining,
                halted,
            } => {
                if *halted {
                    return None;
                }
                if *remaining == 0 {
                    // One probe pull, purely to learn whether output was
                    // truncated. `halted` is sticky from here on.
                    *halted = inner.next().is_some();
                    return None;
                }
                let element = inner.next()?;
                *remaining -= 1;
                Some(element)
            }
        }
    }

    /// An independent queue with the same remaining output.
    pub fn copy(&self) -> Queue {
        match self {
            Queue::Empty => Queue::Empty,
            Queue::Literal { elements, index } => Queue::Literal {
                elements: elements[*index..].iter().map(Queue::copy).collect(),
                index: 0,
            },
            Queue::Natural { value, index } => Queue::Natural {
                value: value - index,
                index: 0,
            },
            Queue::String { value, index } => Queue::String {
                value: value[*index..].to_string(),
                index: 0,
            },
            Queue::SafeFactory { template } => Queue::SafeFactory {
                template: Arc::clone(template),
            },
            Queue::UnsafeFactory { template } => Queue::UnsafeFactory {
                template: Rc::clone(template),
            },
            Queue::Concat { first, second } => Queue::concat(first.copy(), second.copy()),
            Queue::Zip { first, second } => Queue::zip(first.copy(), second.copy()),
            Queue::Flatten { outer, current } => Queue::Flatten {
                outer: Box::new(outer.copy()),
                current: Box::new(current.copy()),
            },
            Queue::Take {
                inner,
                remaining,
                halted,
            } => Queue::Take {
                inner: Box::new(inner.copy()),
                remaining: *remaining,
                halted: *halted,
            },
        }
    }

    /// Whether a [`Queue::Take`] wrapper detected output past its budget.
    pub fn halted(&self) -> bool {
        matches!(self, Queue::Take { halted: true, .. })
    }
}
