//! Instruction decode and execution.
//!
//! One `execute` call runs the semantics of a single RV32IMA + Zicsr +
//! Zifencei instruction against the hart state. The PC was already advanced
//! by the step loop, so relative control transfers are computed from
//! `pc - 4` and a plain fall-through leaves the PC untouched. All arithmetic
//! wraps modulo 2^32 and shift amounts take the low five bits, per the ISA.
//!
//! Traps raised here return as `Err`; nothing is written to the destination
//! register on the faulting path.

use super::Cpu;
use crate::common::Trap;
use crate::core::arch::PrivilegeMode;
use crate::isa::{alu, amo, branch, funct7, load, muldiv, opcode, store, system};

/// Destination register field.
const fn rd(inst: u32) -> usize {
    ((inst >> 7) & 0x1F) as usize
}

/// First source register field.
const fn rs1(inst: u32) -> usize {
    ((inst >> 15) & 0x1F) as usize
}

/// Second source register field.
const fn rs2(inst: u32) -> usize {
    ((inst >> 20) & 0x1F) as usize
}

/// I-type immediate, sign-extended.
const fn imm_i(inst: u32) -> u32 {
    ((inst as i32) >> 20) as u32
}

/// S-type immediate, sign-extended.
const fn imm_s(inst: u32) -> u32 {
    ((((inst & 0xFE00_0000) as i32) >> 20) as u32) | ((inst >> 7) & 0x1F)
}

/// B-type immediate, sign-extended (always even).
const fn imm_b(inst: u32) -> u32 {
    ((((inst & 0x8000_0000) as i32) >> 19) as u32)
        | ((inst & 0x80) << 4)
        | ((inst >> 20) & 0x7E0)
        | ((inst >> 7) & 0x1E)
}

/// U-type immediate.
const fn imm_u(inst: u32) -> u32 {
    inst & 0xFFFF_F000
}

/// J-type immediate, sign-extended (always even).
const fn imm_j(inst: u32) -> u32 {
    ((((inst & 0x8000_0000) as i32) >> 11) as u32)
        | (inst & 0xF_F000)
        | ((inst >> 9) & 0x800)
        | ((inst >> 20) & 0x7FE)
}

impl Cpu {
    /// Executes one decoded instruction.
    pub fn execute(&mut self, inst: u32) -> Result<(), Trap> {
        let funct3 = (inst >> 12) & 0x7;

        match inst & 0x7F {
            opcode::LUI => {
                self.write_reg(rd(inst), imm_u(inst));
                Ok(())
            }
            opcode::AUIPC => {
                let base = self.pc.wrapping_sub(4);
                self.write_reg(rd(inst), base.wrapping_add(imm_u(inst)));
                Ok(())
            }
            opcode::JAL => {
                let target = self.pc.wrapping_sub(4).wrapping_add(imm_j(inst));
                let link = self.pc;
                self.jump(target)?;
                self.write_reg(rd(inst), link);
                Ok(())
            }
            opcode::JALR => {
                let target = self.read_reg(rs1(inst)).wrapping_add(imm_i(inst)) & !1;
                let link = self.pc;
                self.jump(target)?;
                self.write_reg(rd(inst), link);
                Ok(())
            }
            opcode::BRANCH => self.exec_branch(inst, funct3),
            opcode::LOAD => self.exec_load(inst, funct3),
            opcode::STORE => self.exec_store(inst, funct3),
            opcode::OP_IMM => self.exec_op_imm(inst, funct3),
            opcode::OP => self.exec_op(inst, funct3),
            opcode::MISC_MEM => match funct3 {
                // FENCE and FENCE.I order nothing on a single in-order hart.
                0b000 | 0b001 => Ok(()),
                _ => Err(Trap::IllegalInstruction(inst)),
            },
            opcode::AMO => self.exec_amo(inst, funct3),
            opcode::SYSTEM => self.exec_system(inst, funct3),
            _ => Err(Trap::IllegalInstruction(inst)),
        }
    }

    /// Redirects the PC, enforcing 4-byte target alignment.
    fn jump(&mut self, target: u32) -> Result<(), Trap> {
        if target & 3 != 0 {
            return Err(Trap::InstructionAddressMisaligned(u64::from(target)));
        }
        self.pc = target;
        Ok(())
    }

    fn exec_branch(&mut self, inst: u32, funct3: u32) -> Result<(), Trap> {
        let a = self.read_reg(rs1(inst));
        let b = self.read_reg(rs2(inst));
        let taken = match funct3 {
            branch::BEQ => a == b,
            branch::BNE => a != b,
            branch::BLT => (a as i32) < (b as i32),
            branch::BGE => (a as i32) >= (b as i32),
            branch::BLTU => a < b,
            branch::BGEU => a >= b,
            _ => return Err(Trap::IllegalInstruction(inst)),
        };
        if taken {
            let target = self.pc.wrapping_sub(4).wrapping_add(imm_b(inst));
            self.jump(target)?;
        }
        Ok(())
    }

    fn exec_load(&mut self, inst: u32, funct3: u32) -> Result<(), Trap> {
        let addr = self.read_reg(rs1(inst)).wrapping_add(imm_i(inst));
        let value = match funct3 {
            load::LB => self.load(addr, 8)? as u8 as i8 as i32 as u32,
            load::LH => self.load(addr, 16)? as u16 as i16 as i32 as u32,
            load::LW => self.load(addr, 32)? as u32,
            load::LBU => self.load(addr, 8)? as u32,
            load::LHU => self.load(addr, 16)? as u32,
            _ => return Err(Trap::IllegalInstruction(inst)),
        };
        self.write_reg(rd(inst), value);
        Ok(())
    }

    fn exec_store(&mut self, inst: u32, funct3: u32) -> Result<(), Trap> {
        let addr = self.read_reg(rs1(inst)).wrapping_add(imm_s(inst));
        let value = u64::from(self.read_reg(rs2(inst)));
        match funct3 {
            store::SB => self.store(addr, 8, value),
            store::SH => self.store(addr, 16, value),
            store::SW => self.store(addr, 32, value),
            _ => Err(Trap::IllegalInstruction(inst)),
        }
    }

    fn exec_op_imm(&mut self, inst: u32, funct3: u32) -> Result<(), Trap> {
        let a = self.read_reg(rs1(inst));
        let imm = imm_i(inst);
        let shamt = (inst >> 20) & 0x1F;
        let value = match funct3 {
            alu::ADD_SUB => a.wrapping_add(imm),
            alu::SLL => a.wrapping_shl(shamt),
            alu::SLT => u32::from((a as i32) < (imm as i32)),
            alu::SLTU => u32::from(a < imm),
            alu::XOR => a ^ imm,
            alu::SRL_SRA => {
                if inst & 0x4000_0000 != 0 {
                    ((a as i32).wrapping_shr(shamt)) as u32
                } else {
                    a.wrapping_shr(shamt)
                }
            }
            alu::OR => a | imm,
            alu::AND => a & imm,
            _ => return Err(Trap::IllegalInstruction(inst)),
        };
        self.write_reg(rd(inst), value);
        Ok(())
    }

    fn exec_op(&mut self, inst: u32, funct3: u32) -> Result<(), Trap> {
        let a = self.read_reg(rs1(inst));
        let b = self.read_reg(rs2(inst));
        let shamt = b & 0x1F;

        let value = match (inst >> 25) & 0x7F {
            funct7::BASE => match funct3 {
                alu::ADD_SUB => a.wrapping_add(b),
                alu::SLL => a.wrapping_shl(shamt),
                alu::SLT => u32::from((a as i32) < (b as i32)),
                alu::SLTU => u32::from(a < b),
                alu::XOR => a ^ b,
                alu::SRL_SRA => a.wrapping_shr(shamt),
                alu::OR => a | b,
                alu::AND => a & b,
                _ => return Err(Trap::IllegalInstruction(inst)),
            },
            funct7::ALT => match funct3 {
                alu::ADD_SUB => a.wrapping_sub(b),
                alu::SRL_SRA => ((a as i32).wrapping_shr(shamt)) as u32,
                _ => return Err(Trap::IllegalInstruction(inst)),
            },
            funct7::MULDIV => mul_div(funct3, a, b).ok_or(Trap::IllegalInstruction(inst))?,
            _ => return Err(Trap::IllegalInstruction(inst)),
        };
        self.write_reg(rd(inst), value);
        Ok(())
    }

    fn exec_amo(&mut self, inst: u32, funct3: u32) -> Result<(), Trap> {
        // Only word-width atomics exist on RV32.
        if funct3 != 0b010 {
            return Err(Trap::IllegalInstruction(inst));
        }
        let addr = self.read_reg(rs1(inst));
        let funct5 = inst >> 27;

        match funct5 {
            amo::LR => {
                if addr & 3 != 0 {
                    return Err(Trap::LoadAddressMisaligned(u64::from(addr)));
                }
                let value = self.load(addr, 32)? as u32;
                self.write_reg(rd(inst), value);
                self.load_reservation = Some(addr);
                Ok(())
            }
            amo::SC => {
                if addr & 3 != 0 {
                    return Err(Trap::StoreAmoAddressMisaligned(u64::from(addr)));
                }
                if self.load_reservation == Some(addr) {
                    self.store(addr, 32, u64::from(self.read_reg(rs2(inst))))?;
                    self.write_reg(rd(inst), 0);
                } else {
                    self.write_reg(rd(inst), 1);
                }
                self.load_reservation = None;
                Ok(())
            }
            _ => {
                if addr & 3 != 0 {
                    return Err(Trap::StoreAmoAddressMisaligned(u64::from(addr)));
                }
                let old = self.load(addr, 32)? as u32;
                let src = self.read_reg(rs2(inst));
                let new = match funct5 {
                    amo::SWAP => src,
                    amo::ADD => old.wrapping_add(src),
                    amo::XOR => old ^ src,
                    amo::AND => old & src,
                    amo::OR => old | src,
                    amo::MIN => (old as i32).min(src as i32) as u32,
                    amo::MAX => (old as i32).max(src as i32) as u32,
                    amo::MINU => old.min(src),
                    amo::MAXU => old.max(src),
                    _ => return Err(Trap::IllegalInstruction(inst)),
                };
                self.store(addr, 32, u64::from(new))?;
                self.write_reg(rd(inst), old);
                Ok(())
            }
        }
    }

    fn exec_system(&mut self, inst: u32, funct3: u32) -> Result<(), Trap> {
        let csr_addr = inst >> 20;
        match funct3 {
            system::PRIV => {
                let funct7_field = (inst >> 25) & 0x7F;
                match csr_addr {
                    system::ECALL if rs1(inst) == 0 && rd(inst) == 0 => {
                        Err(match self.privilege {
                            PrivilegeMode::User => Trap::EnvironmentCallFromUMode,
                            PrivilegeMode::Supervisor => Trap::EnvironmentCallFromSMode,
                            PrivilegeMode::Machine => Trap::EnvironmentCallFromMMode,
                        })
                    }
                    system::EBREAK if rs1(inst) == 0 && rd(inst) == 0 => {
                        Err(Trap::Breakpoint(self.pc.wrapping_sub(4)))
                    }
                    system::SRET if rs1(inst) == 0 && rd(inst) == 0 => {
                        self.sret();
                        Ok(())
                    }
                    system::MRET if rs1(inst) == 0 && rd(inst) == 0 => {
                        self.mret();
                        Ok(())
                    }
                    system::WFI if rd(inst) == 0 => {
                        // Single hart, synchronous devices: nothing to wait on.
                        Ok(())
                    }
                    _ if funct7_field == system::SFENCE_VMA && rd(inst) == 0 => {
                        // Translation has no cached state to flush.
                        Ok(())
                    }
                    _ => Err(Trap::IllegalInstruction(inst)),
                }
            }
            system::CSRRW => {
                let old = self.load_csr(csr_addr);
                self.store_csr(csr_addr, self.read_reg(rs1(inst)));
                self.write_reg(rd(inst), old);
                Ok(())
            }
            system::CSRRS => {
                let old = self.load_csr(csr_addr);
                if rs1(inst) != 0 {
                    self.store_csr(csr_addr, old | self.read_reg(rs1(inst)));
                }
                self.write_reg(rd(inst), old);
                Ok(())
            }
            system::CSRRC => {
                let old = self.load_csr(csr_addr);
                if rs1(inst) != 0 {
                    self.store_csr(csr_addr, old & !self.read_reg(rs1(inst)));
                }
                self.write_reg(rd(inst), old);
                Ok(())
            }
            system::CSRRWI => {
                let old = self.load_csr(csr_addr);
                self.store_csr(csr_addr, rs1(inst) as u32);
                self.write_reg(rd(inst), old);
                Ok(())
            }
            system::CSRRSI => {
                let old = self.load_csr(csr_addr);
                if rs1(inst) != 0 {
                    self.store_csr(csr_addr, old | rs1(inst) as u32);
                }
                self.write_reg(rd(inst), old);
                Ok(())
            }
            system::CSRRCI => {
                let old = self.load_csr(csr_addr);
                if rs1(inst) != 0 {
                    self.store_csr(csr_addr, old & !(rs1(inst) as u32));
                }
                self.write_reg(rd(inst), old);
                Ok(())
            }
            _ => Err(Trap::IllegalInstruction(inst)),
        }
    }
}

/// M-extension semantics. Division edge cases follow the manual: divide by
/// zero yields all-ones (or the dividend for remainders) and the one signed
/// overflow case saturates back to `i32::MIN`.
fn mul_div(funct3: u32, a: u32, b: u32) -> Option<u32> {
    Some(match funct3 {
        muldiv::MUL => a.wrapping_mul(b),
        muldiv::MULH => {
            ((i64::from(a as i32).wrapping_mul(i64::from(b as i32))) >> 32) as u32
        }
        muldiv::MULHSU => ((i64::from(a as i32).wrapping_mul(i64::from(b))) >> 32) as u32,
        muldiv::MULHU => ((u64::from(a).wrapping_mul(u64::from(b))) >> 32) as u32,
        muldiv::DIV => {
            let (a, b) = (a as i32, b as i32);
            if b == 0 {
                u32::MAX
            } else {
                a.wrapping_div(b) as u32
            }
        }
        muldiv::DIVU => {
            if b == 0 {
                u32::MAX
            } else {
                a / b
            }
        }
        muldiv::REM => {
            let (a, b) = (a as i32, b as i32);
            if b == 0 {
                a as u32
            } else {
                a.wrapping_rem(b) as u32
            }
        }
        muldiv::REMU => {
            if b == 0 {
                a
            } else {
                a % b
            }
        }
        _ => return None,
    })
}
