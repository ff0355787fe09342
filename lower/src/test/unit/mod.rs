mod closure;
mod kernel;
