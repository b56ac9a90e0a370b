// LWRT - lwrt-error
// Module: Error Codes
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Error codes for lwrt

// Execution traps (1000-1099)
/// Memory access outside the current linear memory size
pub const MEMORY_OUT_OF_BOUNDS: u16 = 1000;
/// Integer division or remainder by zero
pub const DIVIDE_BY_ZERO: u16 = 1001;
/// Signed overflow in division or float-to-int truncation
pub const INTEGER_OVERFLOW: u16 = 1002;
/// NaN converted to an integer
pub const INVALID_CONVERSION: u16 = 1003;
/// `unreachable` executed
pub const UNREACHABLE_EXECUTED: u16 = 1004;
/// Table index outside the table
pub const UNDEFINED_ELEMENT: u16 = 1005;
/// Null table slot called
pub const UNINITIALIZED_ELEMENT: u16 = 1006;
/// Indirect call signature check failed
pub const INDIRECT_CALL_TYPE_MISMATCH: u16 = 1007;
/// Call depth or operand stack exhausted
pub const STACK_OVERFLOW: u16 = 1008;
/// Fuel or deadline exhausted
pub const EXECUTION_CANCELLED: u16 = 1009;
/// Process exit requested by the guest
pub const PROCESS_EXIT: u16 = 1010;
/// Host function failed
pub const HOST_TRAP: u16 = 1011;

// Loading (2000-2099)
/// Binary encoding is malformed or truncated
pub const MALFORMED_ENCODING: u16 = 2000;
/// Module failed validation
pub const VALIDATION_FAILED: u16 = 2001;

// Linking (3000-3099)
/// Import has no binding
pub const UNRESOLVED_IMPORT: u16 = 3000;
/// Binding does not match the import's declared type
pub const IMPORT_TYPE_MISMATCH: u16 = 3001;
/// Start function trapped
pub const START_FAILED: u16 = 3002;
/// Declared resource exceeds the host ceiling
pub const LIMIT_EXCEEDED: u16 = 3003;
/// Active segment does not fit its target
pub const SEGMENT_OUT_OF_BOUNDS: u16 = 3004;
/// Linker definition already exists
pub const DUPLICATE_DEFINITION: u16 = 3005;

// Calls (4000-4099)
/// No export with the requested name
pub const NO_SUCH_EXPORT: u16 = 4000;
/// Export is not a function
pub const NOT_A_FUNCTION: u16 = 4001;
/// Arguments do not match the parameter list
pub const ARITY_OR_TYPE_MISMATCH: u16 = 4002;
/// Call ended in a trap
pub const CALL_TRAPPED: u16 = 4003;

// Host and WASI (5000-5099)
/// Owning instance no longer exists
pub const INSTANCE_DROPPED: u16 = 5000;
/// Host function returned values that do not match its signature
pub const HOST_RESULT_MISMATCH: u16 = 5001;
/// Host function needs a linear memory and the caller has none
pub const MISSING_MEMORY: u16 = 5002;
/// Internal engine invariant broken
pub const ENGINE_INVARIANT: u16 = 5003;
/// Host I/O failure
pub const IO_ERROR: u16 = 5004;
