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


//! Match-action table engine.
//!
//! A [`Pipeline`] owns the action registry and every table.  The control plane mutates tables
//! with [`Table::insert`], [`Table::modify`] and [`Table::delete`]; the packet path calls
//! [`Pipeline::apply`] with the packet's [`FieldContext`].  Each table guards its entries with its
//! own lock, so a lookup never sees a half-applied update and tables don't contend.

pub mod action;
pub mod field;
pub mod pipeline;
pub mod table;
pub mod value;

pub use action::{ActionError, ActionFn, ActionId, ActionRegistry, NO_ACTION};
pub use field::{FieldContext, FieldError};
pub use pipeline::{ApplyResult, Pipeline, PipelineBuilder, PipelineError, TableDef};
pub use table::{DefaultAction, Entry, KeyField, Table, TableError, TableSchema, TieBreak};
pub use value::{Lpm, MatchKind, MatchValue, Range, Ternary};
