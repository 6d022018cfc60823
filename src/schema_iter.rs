use crate::column_path::ColumnPath;
use crate::field::Field;
use std::slice::Iter;

#[derive(Debug)]
struct StructIterationState<'a> {
    field_iter: Iter<'a, Field>,
    path: ColumnPath,
}

impl<'a> StructIterationState<'a> {
    fn new(field_iter: Iter<'a, Field>, path: ColumnPath) -> Self {
        Self { field_iter, path }
    }
}

/// Visits every declared field, records and leaves alike, in document order
/// (depth-first, children in declaration order). A parent is always yielded
/// before its children.
#[derive(Debug)]
pub(crate) struct DepthFirstFieldIterator<'a> {
    stack: Vec<StructIterationState<'a>>,
}

impl<'a> DepthFirstFieldIterator<'a> {
    pub(crate) fn new(fields: &'a [Field]) -> Self {
        Self {
            stack: vec![StructIterationState::new(
                fields.iter(),
                ColumnPath::default(),
            )],
        }
    }
}

impl<'a> Iterator for DepthFirstFieldIterator<'a> {
    /// The field and its path from the root. The path depth is the depth of
    /// the field, `1` for top-level fields.
    type Item = (&'a Field, ColumnPath);

    /**
    message Order {
        required int64 order_id;
        repeated group items {
            required int64 item_id;
            repeated string tags;
        }
        required group customer {
            required string name;
        }
    }

    Visit order:
    - order_id
    - items
    - items.item_id
    - items.tags
    - customer
    - customer.name

    Stack Traversal:
    1. Push TopLevel Iterator; path = []
    2. Push items Iterator; path = ["items"]
    3. Pop items Iterator
    4. Push customer Iterator; path = ["customer"]
    5. Pop customer Iterator
    6. Pop TopLevel Iterator
    **/
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(struct_iter) = self.stack.last_mut() {
            if let Some(field) = struct_iter.field_iter.next() {
                let path = struct_iter.path.append_name(field.name());
                if !field.children().is_empty() {
                    self.stack
                        .push(StructIterationState::new(field.children().iter(), path.clone()));
                }
                return Some((field, path));
            }
            self.stack.pop();
        }

        None
    }
}
