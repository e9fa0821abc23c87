// Dashboard handlers (d402)
pub mod d402_merchant_tpv;
