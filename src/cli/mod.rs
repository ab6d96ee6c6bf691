pub mod reflect;
