pub mod d402_merchant_tpv;
