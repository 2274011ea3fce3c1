pub mod arqueo;
pub mod caja;
pub mod movimiento;
pub mod rendicion;
