// Column layout engine.
//
// A row template is a sequence of literal text and named fields. Each field
// kind owns its column (width and alignment) and each row type knows how to
// format the value of its fields, so widths live in exactly one place.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

// Fixed width column. Values wider than the column are written whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub width: usize,
    pub align: Align,
}

impl Column {
    pub const fn left(width: usize) -> Self {
        Self { width, align: Align::Left }
    }

    pub const fn right(width: usize) -> Self {
        Self { width, align: Align::Right }
    }

    // Space fill the value up to the column width
    pub fn pad(&self, value: &str) -> String {
        let width = self.width;

        match self.align {
            Align::Left => format!("{value:<width$}"),
            Align::Right => format!("{value:>width$}"),
        }
    }
}

// A named field with a fixed column
pub trait LayoutField: Copy {
    fn column(self) -> Column;
}

// Something that can fill the fields of a row template
pub trait Row {
    type Field: LayoutField;

    // Return the unpadded text of the given field
    fn value(&self, field: Self::Field) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<F> {
    Text(&'static str),
    Value(F),
}

// Render one template line for the given row
pub fn fill<R: Row>(template: &[Segment<R::Field>], row: &R) -> String {
    let mut line = String::new();

    for segment in template {
        match segment {
            Segment::Text(text) => line.push_str(text),
            Segment::Value(field) => {
                let value = row.value(*field);
                line.push_str(&field.column().pad(&value));
            }
        }
    }

    line
}
