/*
Copyright (c) 2021 VMware, Inc.
SPDX-License-Identifier: MIT
Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/


//! Per-packet metadata fields read by table lookups and written by actions.

use std::collections::HashMap;

use thiserror::Error;

use crate::value::width_mask;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("unknown field {0}")]
    UnknownField(String),

    #[error("field {name} declared twice")]
    DuplicateField { name: String },

    #[error("field {name} has width {width}, but widths must be between 1 and 128 bits")]
    BadWidth { name: String, width: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Field {
    value: u128,
    width: u32,
}

/// The named, fixed-width fields of one packet's metadata.  Every field starts out zero.
#[derive(Clone, Debug, Default)]
pub struct FieldContext {
    fields: HashMap<String, Field>,
}

impl FieldContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: &str, width: u32) -> Result<(), FieldError> {
        if width == 0 || width > 128 {
            return Err(FieldError::BadWidth { name: name.into(), width });
        }
        if self.fields.contains_key(name) {
            return Err(FieldError::DuplicateField { name: name.into() });
        }
        self.fields.insert(name.into(), Field { value: 0, width });
        Ok(())
    }

    /// Returns the current value of `name` and its width in bits.
    pub fn read(&self, name: &str) -> Result<(u128, u32), FieldError> {
        self.fields
            .get(name)
            .map(|f| (f.value, f.width))
            .ok_or_else(|| FieldError::UnknownField(name.into()))
    }

    pub fn get(&self, name: &str) -> Result<u128, FieldError> {
        self.read(name).map(|(value, _)| value)
    }

    /// Sets `name` to `value`, truncated to the field's width.
    pub fn set(&mut self, name: &str, value: u128) -> Result<(), FieldError> {
        let field = self
            .fields
            .get_mut(name)
            .ok_or_else(|| FieldError::UnknownField(name.into()))?;
        field.value = value & width_mask(field.width);
        Ok(())
    }

    /// Zeroes every field, keeping the declarations.
    pub fn reset(&mut self) {
        for field in self.fields.values_mut() {
            field.value = 0;
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_masks_to_width() {
        let mut ctx = FieldContext::new();
        ctx.declare("meta.ip_protocol", 8).unwrap();
        ctx.declare("meta.dst_ip_addr", 128).unwrap();

        ctx.set("meta.ip_protocol", 0x1_06).unwrap();
        assert_eq!(ctx.read("meta.ip_protocol"), Ok((6, 8)));
        ctx.set("meta.dst_ip_addr", u128::MAX).unwrap();
        assert_eq!(ctx.get("meta.dst_ip_addr"), Ok(u128::MAX));

        ctx.reset();
        assert_eq!(ctx.get("meta.dst_ip_addr"), Ok(0));
    }

    #[test]
    fn errors() {
        let mut ctx = FieldContext::new();
        ctx.declare("meta.eni_id", 16).unwrap();
        assert_eq!(
            ctx.declare("meta.eni_id", 16),
            Err(FieldError::DuplicateField { name: "meta.eni_id".into() })
        );
        assert!(matches!(ctx.declare("meta.wide", 129), Err(FieldError::BadWidth { .. })));
        assert_eq!(ctx.get("meta.vni"), Err(FieldError::UnknownField("meta.vni".into())));
        assert!(ctx.set("meta.vni", 1).is_err());
    }
}
