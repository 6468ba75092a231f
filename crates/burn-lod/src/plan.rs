use alloc::format;
use alloc::vec::Vec;
use core::ops::Range;

use crate::{RowShape, Shape, ValidationError};

/// A run of rows copied from one input into the output.
///
/// Ranges are expressed in rows, the first dimension of the tensors. The [layout](PlanLayout)
/// of the plan tells how a row maps to flat elements.
#[derive(new, Debug, Clone, PartialEq, Eq)]
pub struct CopyEntry {
    /// Index of the input tensor.
    pub input: usize,
    /// Rows of the input tensor.
    pub source: Range<usize>,
    /// Rows of the output tensor.
    pub destination: Range<usize>,
}

/// A contiguous run of flat elements copied from one input into the output.
#[derive(new, Debug, Clone, PartialEq, Eq)]
pub struct CopySpan {
    /// Index of the input tensor.
    pub input: usize,
    /// Elements of the input buffer.
    pub source: Range<usize>,
    /// Elements of the output buffer.
    pub destination: Range<usize>,
}

/// How rows of the inputs and of the output map to flat row-major elements.
///
/// A row is split into `chunks_per_row` chunks, the product of the dimensions between the first
/// one and the concatenation axis. Each chunk of input `i` holds `source_widths[i]` elements and
/// lands at column `column_offsets[i]` of the output chunk, which holds `destination_width`
/// elements. When joining along the first axis there is a single chunk per row and every input
/// chunk fills a whole output chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanLayout {
    /// Number of chunks per row.
    pub chunks_per_row: usize,
    /// Number of elements of an input chunk, for each input.
    pub source_widths: Vec<usize>,
    /// Number of elements of an output chunk.
    pub destination_width: usize,
    /// Offset of each input chunk inside an output chunk.
    pub column_offsets: Vec<usize>,
}

impl PlanLayout {
    /// Computes the layout of the concatenation of tensors with the given shapes along `axis`.
    ///
    /// The shapes must already be validated with [concat_shape](crate::concat_shape).
    pub fn new(shapes: &[Shape], axis: usize) -> Self {
        if axis == 0 {
            let width = shapes.first().map(RowShape::row_width).unwrap_or_default();

            return Self {
                chunks_per_row: 1,
                source_widths: shapes.iter().map(RowShape::row_width).collect(),
                destination_width: width,
                column_offsets: shapes.iter().map(|_| 0).collect(),
            };
        }

        let chunks_per_row = shapes
            .first()
            .map(|shape| shape.dims[1..axis].iter().product())
            .unwrap_or(1);
        let source_widths: Vec<usize> = shapes
            .iter()
            .map(|shape| shape.dims[axis..].iter().product())
            .collect();
        let column_offsets = source_widths
            .iter()
            .scan(0, |offset, width| {
                let current = *offset;
                *offset += width;
                Some(current)
            })
            .collect();

        Self {
            chunks_per_row,
            destination_width: source_widths.iter().sum(),
            source_widths,
            column_offsets,
        }
    }

    fn spans(&self, entry: &CopyEntry) -> Vec<CopySpan> {
        let width = self.source_widths[entry.input];
        let column = self.column_offsets[entry.input];
        let chunks = entry.source.len() * self.chunks_per_row;
        let source_chunk = entry.source.start * self.chunks_per_row;
        let destination_chunk = entry.destination.start * self.chunks_per_row;

        if width == self.destination_width {
            let source = source_chunk * width..(source_chunk + chunks) * width;
            let destination = destination_chunk * width..(destination_chunk + chunks) * width;

            return alloc::vec![CopySpan::new(entry.input, source, destination)];
        }

        (0..chunks)
            .map(|chunk| {
                let source = (source_chunk + chunk) * width;
                let destination = (destination_chunk + chunk) * self.destination_width + column;

                CopySpan::new(
                    entry.input,
                    source..source + width,
                    destination..destination + width,
                )
            })
            .collect()
    }
}

/// Describes every copy needed to concatenate the inputs into the output.
///
/// The destination ranges of the entries are pairwise disjoint and cover the whole output, so the
/// same plan can be applied in reverse to scatter the output gradient back into the inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyPlan {
    entries: Vec<CopyEntry>,
    layout: PlanLayout,
    input_elements: Vec<usize>,
    output_elements: usize,
}

impl CopyPlan {
    /// Creates a plan from its entries and the shapes of its inputs and output.
    pub fn new(
        entries: Vec<CopyEntry>,
        layout: PlanLayout,
        inputs: &[Shape],
        output: &Shape,
    ) -> Self {
        Self {
            entries,
            layout,
            input_elements: inputs.iter().map(Shape::num_elements).collect(),
            output_elements: output.num_elements(),
        }
    }

    /// The entries of the plan, in destination order.
    pub fn entries(&self) -> &[CopyEntry] {
        &self.entries
    }

    /// The layout of the plan.
    pub fn layout(&self) -> &PlanLayout {
        &self.layout
    }

    /// Number of inputs.
    pub fn num_inputs(&self) -> usize {
        self.input_elements.len()
    }

    /// Number of elements of the given input.
    pub fn input_elements(&self, input: usize) -> usize {
        self.input_elements[input]
    }

    /// Number of elements of the output.
    pub fn output_elements(&self) -> usize {
        self.output_elements
    }

    /// Checks that every entry reads an existing input and stays within the input and output
    /// buffers, so the plan can be expanded into [spans](Self::spans) and applied.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let layout = &self.layout;
        let num_inputs = self.num_inputs();

        if layout.source_widths.len() != num_inputs || layout.column_offsets.len() != num_inputs {
            return Err(ValidationError::PlanMismatch(format!(
                "the layout describes {} inputs, expected {num_inputs}",
                layout.source_widths.len()
            )));
        }

        for entry in self.entries.iter() {
            let input = entry.input;

            if input >= num_inputs {
                return Err(ValidationError::PlanMismatch(format!(
                    "an entry reads input {input} of a plan with {num_inputs} inputs"
                )));
            }

            if entry.source.start > entry.source.end
                || entry.destination.start > entry.destination.end
                || entry.source.len() != entry.destination.len()
            {
                return Err(ValidationError::PlanMismatch(format!(
                    "rows {:?} of input {input} can't be copied to rows {:?}",
                    entry.source, entry.destination
                )));
            }

            let width = layout.source_widths[input];
            let column = layout.column_offsets[input];

            if column
                .checked_add(width)
                .map_or(true, |end| end > layout.destination_width)
            {
                return Err(ValidationError::PlanMismatch(format!(
                    "chunks of input {input} don't fit in the output chunks"
                )));
            }

            let source_end = entry
                .source
                .end
                .checked_mul(layout.chunks_per_row)
                .and_then(|chunks| chunks.checked_mul(width));

            if source_end.map_or(true, |end| end > self.input_elements[input]) {
                return Err(ValidationError::PlanMismatch(format!(
                    "rows {:?} are out of bounds for input {input} of {} elements",
                    entry.source, self.input_elements[input]
                )));
            }

            let destination_end = entry
                .destination
                .end
                .checked_mul(layout.chunks_per_row)
                .and_then(|chunks| chunks.checked_mul(layout.destination_width));

            if destination_end.map_or(true, |end| end > self.output_elements) {
                return Err(ValidationError::PlanMismatch(format!(
                    "rows {:?} are out of bounds for the output of {} elements",
                    entry.destination, self.output_elements
                )));
            }
        }

        Ok(())
    }

    /// Expands every entry into the flat element spans it copies.
    ///
    /// The plan must be [valid](Self::validate).
    pub fn spans(&self) -> impl Iterator<Item = CopySpan> + '_ {
        self.entries
            .iter()
            .flat_map(|entry| self.layout.spans(entry))
    }

    /// Checks that the destination spans cover every output element exactly once.
    pub fn check_partition(&self) -> Result<(), ValidationError> {
        let mut spans: Vec<Range<usize>> = self.spans().map(|span| span.destination).collect();
        spans.sort_by_key(|span| span.start);

        let mut covered = 0;
        for span in spans {
            if span.start != covered {
                return Err(ValidationError::PlanMismatch(format!(
                    "destination elements {covered}..{} are {}",
                    span.start,
                    if span.start < covered {
                        "written more than once"
                    } else {
                        "never written"
                    }
                )));
            }
            covered = span.end;
        }

        if covered != self.output_elements {
            return Err(ValidationError::PlanMismatch(format!(
                "destination elements {covered}..{} are never written",
                self.output_elements
            )));
        }

        Ok(())
    }
}

/// Splits a buffer into the mutable regions described by the given spans.
///
/// Spans must be sorted by their start and must not overlap.
pub(crate) fn split_disjoint<'a, E, T>(
    buffer: &'a mut [E],
    spans: Vec<(Range<usize>, T)>,
) -> Result<Vec<(&'a mut [E], T)>, ValidationError> {
    let mut rest = buffer;
    let mut offset = 0;
    let mut parts = Vec::with_capacity(spans.len());

    for (span, payload) in spans {
        if span.start < offset || span.end > offset + rest.len() {
            return Err(ValidationError::PlanMismatch(format!(
                "span {span:?} overlaps a previous span or exceeds the buffer"
            )));
        }

        let (_, tail) = core::mem::take(&mut rest).split_at_mut(span.start - offset);
        let (part, tail) = tail.split_at_mut(span.len());

        rest = tail;
        offset = span.end;
        parts.push((part, payload));
    }

    Ok(parts)
}
