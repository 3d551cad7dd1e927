//! Time value of money helpers with numpy-financial sign conventions.
//!
//! Payments are due at the end of each period. Cash paid out is negative,
//! so `pmt(r, n, -cost)` is the positive annual payment for a cost.

/// Periodic payment that amortizes present value `pv` over `nper` periods.
pub fn pmt(rate: f64, nper: f64, pv: f64) -> f64 {
    if nper == 0.0 {
        return -pv;
    }
    if rate == 0.0 {
        return -pv / nper;
    }
    let growth = (1.0 + rate).powf(nper);
    -pv * rate * growth / (growth - 1.0)
}

/// Future value after `nper` periods of present value `pv` and payment `pmt`.
pub fn fv(rate: f64, nper: f64, pmt: f64, pv: f64) -> f64 {
    if rate == 0.0 {
        return -(pv + pmt * nper);
    }
    let growth = (1.0 + rate).powf(nper);
    -(pv * growth + pmt * (growth - 1.0) / rate)
}

/// Present value of future value `fv` and payment `pmt` over `nper` periods.
pub fn pv(rate: f64, nper: f64, pmt: f64, fv: f64) -> f64 {
    if rate == 0.0 {
        return -(fv + pmt * nper);
    }
    let growth = (1.0 + rate).powf(nper);
    -(fv + pmt * (growth - 1.0) / rate) / growth
}

/// Equivalent annual cost of an up-front `cost` over `lifespan` years.
pub fn equivalent_annual_cost(cost: f64, rate: f64, lifespan: u32) -> f64 {
    pmt(rate, f64::from(lifespan), -cost)
}
